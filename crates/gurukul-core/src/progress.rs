//! Per-student progress tracking.
//!
//! `record_progress` is a plain read-modify-write against the store: one
//! `get` followed by one `set` or `update`. Two concurrent calls for the same
//! (student, class) pair can lose an update.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AnalyticsError, Result, StoreError};
use crate::model::{collections, DocumentKey, FieldValue, Fields, ProgressRecord};
use crate::traits::DocumentStore;

/// Updates and reads [`ProgressRecord`]s.
pub struct ProgressTracker {
    store: Arc<dyn DocumentStore>,
}

/// Running average after one more grade.
///
/// The weight is the completed count *before* this event is applied, so a
/// completed, graded event contributes as if it were one of
/// `completed + 1` grades. Downstream dashboards depend on these exact
/// numbers.
pub fn next_average(average: f64, completed_before: u32, grade: f64) -> f64 {
    let completed = f64::from(completed_before);
    (average * completed + grade) / (completed + 1.0)
}

/// Key for a pair, rejecting empty identifiers.
///
/// The composite id `{student}_{class}` would otherwise be non-empty even
/// when one side is missing.
fn checked_key(student_id: &str, class_id: &str) -> std::result::Result<DocumentKey, StoreError> {
    let key = ProgressRecord::key(student_id, class_id);
    if student_id.is_empty() || class_id.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(key)
}

/// A record for a pair that has never been seen.
pub fn first_record(
    student_id: &str,
    class_id: &str,
    completed: bool,
    grade: Option<f64>,
    now: DateTime<Utc>,
) -> ProgressRecord {
    ProgressRecord {
        student_id: student_id.to_string(),
        class_id: class_id.to_string(),
        assignments_completed: u32::from(completed),
        assignments_total: 0,
        average_grade: grade.unwrap_or(0.0),
        last_active: now,
    }
}

/// Apply one progress event to an existing record.
pub fn advance(
    current: &ProgressRecord,
    completed: bool,
    grade: Option<f64>,
    now: DateTime<Utc>,
) -> ProgressRecord {
    let mut next = current.clone();
    next.last_active = now;
    if completed {
        next.assignments_completed = current.assignments_completed.saturating_add(1);
    }
    if let Some(grade) = grade {
        next.average_grade =
            next_average(current.average_grade, current.assignments_completed, grade);
    }
    next
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record a progress event for a student in a class.
    ///
    /// Returns the record as written. A NaN or infinite grade is rejected
    /// with [`AnalyticsError::InvalidGrade`] before the store is touched.
    pub async fn record_progress(
        &self,
        student_id: &str,
        class_id: &str,
        completed: bool,
        grade: Option<f64>,
    ) -> Result<ProgressRecord> {
        self.record_progress_at(student_id, class_id, completed, grade, Utc::now())
            .await
    }

    /// [`record_progress`](Self::record_progress) with an explicit clock reading.
    pub async fn record_progress_at(
        &self,
        student_id: &str,
        class_id: &str,
        completed: bool,
        grade: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord> {
        const OPERATION: &str = "record progress";

        if let Some(g) = grade.filter(|g| !g.is_finite()) {
            return Err(AnalyticsError::InvalidGrade(g));
        }
        let key = checked_key(student_id, class_id).map_err(AnalyticsError::failed(OPERATION))?;
        let existing = self
            .store
            .get(&key)
            .await
            .map_err(AnalyticsError::failed(OPERATION))?;

        match existing {
            Some(doc) => {
                let current = ProgressRecord::from_document(collections::STUDENT_PROGRESS, &doc)
                    .map_err(AnalyticsError::failed(OPERATION))?;
                let next = advance(&current, completed, grade, now);

                let mut changes = Fields::new();
                changes.insert("lastActive".into(), FieldValue::from(next.last_active));
                changes.insert(
                    "assignmentsCompleted".into(),
                    FieldValue::from(next.assignments_completed),
                );
                if grade.is_some() {
                    changes.insert("averageGrade".into(), FieldValue::from(next.average_grade));
                }

                self.store
                    .update(&key, changes)
                    .await
                    .map_err(AnalyticsError::failed(OPERATION))?;
                tracing::debug!(
                    %key,
                    completed = next.assignments_completed,
                    average = next.average_grade,
                    "progress updated"
                );
                Ok(next)
            }
            None => {
                let record = first_record(student_id, class_id, completed, grade, now);
                self.store
                    .set(&key, record.to_fields())
                    .await
                    .map_err(AnalyticsError::failed(OPERATION))?;
                tracing::debug!(%key, "progress record created");
                Ok(record)
            }
        }
    }

    /// Read the progress record for a pair, if one exists.
    pub async fn progress(&self, student_id: &str, class_id: &str) -> Result<Option<ProgressRecord>> {
        const OPERATION: &str = "read progress";

        let key = checked_key(student_id, class_id).map_err(AnalyticsError::failed(OPERATION))?;
        let doc = self
            .store
            .get(&key)
            .await
            .map_err(AnalyticsError::failed(OPERATION))?;
        doc.map(|d| ProgressRecord::from_document(collections::STUDENT_PROGRESS, &d))
            .transpose()
            .map_err(AnalyticsError::failed(OPERATION))
    }
}
