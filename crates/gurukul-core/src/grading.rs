//! Grade extraction from generated feedback, and the auto-grading flow.
//!
//! Extraction is best-effort: generated text has no fixed format, so
//! [`extract_score`] looks for the word "score" followed by a number on the
//! same line and gives up with `None` otherwise.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assistant::Assistant;
use crate::error::{AnalyticsError, Result, StoreError};
use crate::model::{collections, FieldValue, Fields, Submission};
use crate::traits::DocumentStore;

const KEYWORD: &str = "score";

/// Find the first number following "score" (any case) on the same line.
///
/// Occurrences of the keyword with no digits before the end of their line
/// are skipped. Numbers too large for a `u32` are skipped as well.
pub fn extract_score(text: &str) -> Option<u32> {
    // ASCII lowercasing keeps byte offsets identical to `text`.
    let lower = text.to_ascii_lowercase();
    let mut from = 0;

    while let Some(pos) = lower[from..].find(KEYWORD) {
        let after = from + pos + KEYWORD.len();
        let line_end = lower[after..]
            .find(|c: char| c == '\n' || c == '\r')
            .map(|i| after + i)
            .unwrap_or(lower.len());
        let line = &lower.as_bytes()[after..line_end];

        if let Some(start) = line.iter().position(u8::is_ascii_digit) {
            let digits: String = line[start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .map(|&b| char::from(b))
                .collect();
            if let Ok(score) = digits.parse() {
                return Some(score);
            }
        }
        from = from + pos + 1;
    }

    None
}

/// Store a new submission and return its generated id.
pub async fn submit_assignment(
    store: &dyn DocumentStore,
    assignment_id: &str,
    student_id: &str,
    content: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let mut fields = Fields::new();
    fields.insert("assignmentId".into(), assignment_id.into());
    fields.insert("studentId".into(), student_id.into());
    fields.insert("content".into(), content.into());
    fields.insert("attachments".into(), FieldValue::Array(Vec::new()));
    fields.insert("submittedAt".into(), now.into());

    let id = store
        .add(collections::SUBMISSIONS, fields)
        .await
        .map_err(AnalyticsError::failed("submit assignment"))?;
    tracing::debug!(assignment_id, student_id, %id, "submission stored");
    Ok(id)
}

/// Result of grading one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeOutcome {
    pub submission_id: String,
    pub grade: u32,
    pub feedback: String,
}

/// Grades stored submissions with generated feedback.
pub struct AutoGrader {
    store: Arc<dyn DocumentStore>,
    assistant: Assistant,
}

impl AutoGrader {
    pub fn new(store: Arc<dyn DocumentStore>, assistant: Assistant) -> Self {
        Self { store, assistant }
    }

    /// Generate feedback for a submission and store the extracted grade.
    ///
    /// Nothing is written when no score can be found in the feedback.
    pub async fn auto_grade(&self, submission_id: &str, assignment_kind: &str) -> Result<GradeOutcome> {
        self.auto_grade_at(submission_id, assignment_kind, Utc::now())
            .await
    }

    pub async fn auto_grade_at(
        &self,
        submission_id: &str,
        assignment_kind: &str,
        now: DateTime<Utc>,
    ) -> Result<GradeOutcome> {
        const OPERATION: &str = "auto-grade submission";

        let key = Submission::key(submission_id);
        let doc = self
            .store
            .get(&key)
            .await
            .map_err(AnalyticsError::failed(OPERATION))?
            .ok_or_else(|| {
                AnalyticsError::failed(OPERATION)(StoreError::NotFound(key.to_string()))
            })?;
        let submission =
            Submission::from_document(&doc).map_err(AnalyticsError::failed(OPERATION))?;

        let feedback = self
            .assistant
            .grade_submission(assignment_kind, &submission.content, None)
            .await
            .map_err(AnalyticsError::Generation)?;

        let Some(grade) = extract_score(&feedback) else {
            tracing::warn!(submission_id, "no score found in generated feedback");
            return Err(AnalyticsError::GradeNotFound);
        };

        let mut changes = Fields::new();
        changes.insert("grade".into(), FieldValue::from(grade));
        changes.insert("feedback".into(), FieldValue::from(feedback.as_str()));
        changes.insert("gradedAt".into(), FieldValue::from(now));
        self.store
            .update(&key, changes)
            .await
            .map_err(AnalyticsError::failed(OPERATION))?;

        tracing::info!(submission_id, grade, "submission graded");
        Ok(GradeOutcome {
            submission_id: submission_id.to_string(),
            grade,
            feedback,
        })
    }
}
