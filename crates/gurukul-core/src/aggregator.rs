//! Class summary aggregation.
//!
//! A refresh reads the class roster, fetches every roster student's progress
//! record concurrently, folds them with [`statistics::summarize`], and
//! overwrites the stored summary. Any failing fetch aborts the refresh
//! before anything is written.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::model::{collections, ClassSummary, DocumentKey, FieldValue, Fields, ProgressRecord};
use crate::statistics::{self, SummaryParams};
use crate::traits::{Direction, DocumentStore, Filter, Query};

/// Configuration for the class aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Days of inactivity after which a student no longer counts as active.
    #[serde(default = "default_active_window_days")]
    pub active_window_days: u32,
    /// Assignments assumed per student for the completion rate.
    #[serde(default = "default_assumed_assignments")]
    pub assumed_assignments: u32,
}

fn default_active_window_days() -> u32 {
    7
}
fn default_assumed_assignments() -> u32 {
    10
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            active_window_days: default_active_window_days(),
            assumed_assignments: default_assumed_assignments(),
        }
    }
}

impl AggregatorConfig {
    pub fn summary_params(&self) -> SummaryParams {
        SummaryParams {
            active_window: Duration::try_days(i64::from(self.active_window_days))
                .unwrap_or(Duration::MAX),
            assumed_assignments: self.assumed_assignments,
        }
    }
}

/// Recomputes and reads [`ClassSummary`] records.
pub struct ClassAggregator {
    store: Arc<dyn DocumentStore>,
    params: SummaryParams,
}

impl ClassAggregator {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AggregatorConfig) -> Self {
        Self {
            store,
            params: config.summary_params(),
        }
    }

    /// Student ids enrolled in a class.
    ///
    /// Students are `users` documents with `role == "student"` whose
    /// `classes` array contains the class id, ordered by display name.
    pub async fn roster(&self, class_id: &str) -> Result<Vec<String>> {
        let query = Query::collection(collections::USERS)
            .filter(Filter::eq("role", "student"))
            .filter(Filter::array_contains("classes", class_id))
            .order_by("displayName", Direction::Ascending);
        let docs = self
            .store
            .query(&query)
            .await
            .map_err(AnalyticsError::failed("fetch class roster"))?;
        Ok(docs.into_iter().map(|d| d.id).collect())
    }

    /// Add a class to a student's `classes`, creating the user if needed.
    ///
    /// Existing users keep their role and display name.
    pub async fn enroll(&self, student_id: &str, display_name: &str, class_id: &str) -> Result<()> {
        const OPERATION: &str = "enroll student";

        let key = DocumentKey::new(collections::USERS, student_id);
        let existing = self
            .store
            .get(&key)
            .await
            .map_err(AnalyticsError::failed(OPERATION))?;

        match existing {
            Some(doc) => {
                let mut classes = doc
                    .fields
                    .get("classes")
                    .and_then(FieldValue::as_array)
                    .map(<[FieldValue]>::to_vec)
                    .unwrap_or_default();
                if classes.iter().any(|c| c.as_str() == Some(class_id)) {
                    return Ok(());
                }
                classes.push(class_id.into());
                let mut changes = Fields::new();
                changes.insert("classes".into(), FieldValue::Array(classes));
                self.store
                    .update(&key, changes)
                    .await
                    .map_err(AnalyticsError::failed(OPERATION))?;
            }
            None => {
                let mut fields = Fields::new();
                fields.insert("uid".into(), student_id.into());
                fields.insert("displayName".into(), display_name.into());
                fields.insert("role".into(), "student".into());
                fields.insert("classes".into(), FieldValue::Array(vec![class_id.into()]));
                self.store
                    .set(&key, fields)
                    .await
                    .map_err(AnalyticsError::failed(OPERATION))?;
            }
        }

        tracing::debug!(student_id, class_id, "student enrolled");
        Ok(())
    }

    /// Recompute the summary for a class and overwrite the stored one.
    pub async fn refresh_class_summary(&self, class_id: &str) -> Result<ClassSummary> {
        self.refresh_class_summary_at(class_id, Utc::now()).await
    }

    /// [`refresh_class_summary`](Self::refresh_class_summary) with an explicit clock reading.
    pub async fn refresh_class_summary_at(
        &self,
        class_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ClassSummary> {
        const OPERATION: &str = "refresh class summary";

        let roster = self.roster(class_id).await?;

        let fetches = roster.iter().map(|student_id| {
            let key = ProgressRecord::key(student_id, class_id);
            let store = Arc::clone(&self.store);
            async move {
                let doc = store.get(&key).await?;
                doc.map(|d| ProgressRecord::from_document(collections::STUDENT_PROGRESS, &d))
                    .transpose()
            }
        });
        let records: Vec<ProgressRecord> = try_join_all(fetches)
            .await
            .map_err(AnalyticsError::failed(OPERATION))?
            .into_iter()
            .flatten()
            .collect();

        let summary = statistics::summarize(class_id, roster.len(), &records, now, &self.params);

        self.store
            .set(&ClassSummary::key(class_id), summary.to_fields())
            .await
            .map_err(AnalyticsError::failed(OPERATION))?;

        tracing::info!(
            class_id,
            roster = roster.len(),
            tracked = records.len(),
            active = summary.active_students,
            "class summary refreshed"
        );
        Ok(summary)
    }

    /// Read the stored summary for a class, if one has been computed.
    pub async fn class_summary(&self, class_id: &str) -> Result<Option<ClassSummary>> {
        const OPERATION: &str = "read class summary";

        let doc = self
            .store
            .get(&ClassSummary::key(class_id))
            .await
            .map_err(AnalyticsError::failed(OPERATION))?;
        doc.map(|d| ClassSummary::from_document(&d))
            .transpose()
            .map_err(AnalyticsError::failed(OPERATION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 20, 8, 30, 0).unwrap()
    }

    fn enroll(store: &MemoryStore, uid: &str, name: &str, classes: &[&str]) {
        let mut fields = Fields::new();
        fields.insert("uid".into(), uid.into());
        fields.insert("displayName".into(), name.into());
        fields.insert("role".into(), "student".into());
        fields.insert(
            "classes".into(),
            FieldValue::Array(classes.iter().map(|c| (*c).into()).collect()),
        );
        store.seed(&DocumentKey::new(collections::USERS, uid), fields);
    }

    fn progress(store: &MemoryStore, student: &str, completed: u32, average: f64, age: Duration) {
        let record = ProgressRecord {
            student_id: student.into(),
            class_id: "c1".into(),
            assignments_completed: completed,
            assignments_total: 0,
            average_grade: average,
            last_active: now() - age,
        };
        store.seed(&ProgressRecord::key(student, "c1"), record.to_fields());
    }

    fn aggregator(store: &Arc<MemoryStore>) -> ClassAggregator {
        ClassAggregator::new(store.clone(), &AggregatorConfig::default())
    }

    #[tokio::test]
    async fn empty_class() {
        let store = Arc::new(MemoryStore::new());
        let summary = aggregator(&store)
            .refresh_class_summary_at("c1", now())
            .await
            .unwrap();
        assert_eq!(summary.total_students, 0);
        assert_eq!(summary.active_students, 0);
        assert_eq!(summary.average_grade, 0.0);
        assert_eq!(summary.completion_rate, 0.0);
    }

    #[tokio::test]
    async fn untracked_student_counts_only_toward_total() {
        let store = Arc::new(MemoryStore::new());
        enroll(&store, "s1", "Asha", &["c1"]);
        enroll(&store, "s2", "Ravi", &["c1"]);
        enroll(&store, "s3", "Meera", &["c1", "c2"]);
        enroll(&store, "s4", "Other", &["c2"]);
        progress(&store, "s1", 4, 80.0, Duration::days(1));
        progress(&store, "s2", 2, 60.0, Duration::days(10));

        let summary = aggregator(&store)
            .refresh_class_summary_at("c1", now())
            .await
            .unwrap();
        assert_eq!(summary.total_students, 3);
        assert_eq!(summary.active_students, 1);
        assert_eq!(summary.average_grade, 70.0);
        assert_eq!(summary.completion_rate, 6.0 / 20.0);
    }

    #[tokio::test]
    async fn seven_days_and_one_second_is_inactive() {
        let store = Arc::new(MemoryStore::new());
        enroll(&store, "s1", "Asha", &["c1"]);
        enroll(&store, "s2", "Ravi", &["c1"]);
        progress(
            &store,
            "s1",
            1,
            50.0,
            Duration::days(7) + Duration::seconds(1),
        );
        progress(
            &store,
            "s2",
            1,
            50.0,
            Duration::days(7) - Duration::seconds(1),
        );

        let summary = aggregator(&store)
            .refresh_class_summary_at("c1", now())
            .await
            .unwrap();
        assert_eq!(summary.active_students, 1);
    }

    #[tokio::test]
    async fn refresh_overwrites_stored_summary() {
        let store = Arc::new(MemoryStore::new());
        enroll(&store, "s1", "Asha", &["c1"]);
        progress(&store, "s1", 3, 90.0, Duration::hours(2));
        let agg = aggregator(&store);

        let mut stale = Fields::new();
        stale.insert("legacy".into(), true.into());
        store.seed(&ClassSummary::key("c1"), stale);

        let summary = agg.refresh_class_summary_at("c1", now()).await.unwrap();
        let stored = agg.class_summary("c1").await.unwrap().unwrap();
        assert_eq!(stored, summary);

        let raw = store
            .get(&ClassSummary::key("c1"))
            .await
            .unwrap()
            .unwrap();
        assert!(!raw.fields.contains_key("legacy"));
    }

    #[tokio::test]
    async fn failed_fetch_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        enroll(&store, "s1", "Asha", &["c1"]);
        store.fail_collection(collections::STUDENT_PROGRESS, "quota exceeded");

        let err = aggregator(&store)
            .refresh_class_summary_at("c1", now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::OperationFailed {
                source: StoreError::Network(_),
                ..
            }
        ));
        assert_eq!(store.len(collections::CLASS_ANALYTICS), 0);
    }

    #[tokio::test]
    async fn failed_roster_query_is_reported() {
        let store = Arc::new(MemoryStore::new());
        store.fail_collection(collections::USERS, "permission");
        let err = aggregator(&store)
            .refresh_class_summary_at("c1", now())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("fetch class roster failed"));
    }

    #[tokio::test]
    async fn configured_window_and_denominator() {
        let store = Arc::new(MemoryStore::new());
        enroll(&store, "s1", "Asha", &["c1"]);
        progress(&store, "s1", 5, 70.0, Duration::days(20));
        let config = AggregatorConfig {
            active_window_days: 30,
            assumed_assignments: 5,
        };
        let summary = ClassAggregator::new(store.clone(), &config)
            .refresh_class_summary_at("c1", now())
            .await
            .unwrap();
        assert_eq!(summary.active_students, 1);
        assert_eq!(summary.completion_rate, 1.0);
    }

    #[tokio::test]
    async fn oversized_window_marks_every_record_active() {
        let store = Arc::new(MemoryStore::new());
        enroll(&store, "s1", "Asha", &["c1"]);
        enroll(&store, "s2", "Ravi", &["c1"]);
        progress(&store, "s1", 1, 60.0, Duration::days(400));
        progress(&store, "s2", 1, 80.0, Duration::hours(1));
        let config = AggregatorConfig {
            active_window_days: 100_000_000,
            ..AggregatorConfig::default()
        };

        let summary = ClassAggregator::new(store.clone(), &config)
            .refresh_class_summary_at("c1", now())
            .await
            .unwrap();
        assert_eq!(summary.active_students, 2);

        let widest = AggregatorConfig {
            active_window_days: u32::MAX,
            ..AggregatorConfig::default()
        };
        let summary = ClassAggregator::new(store.clone(), &widest)
            .refresh_class_summary_at("c1", now())
            .await
            .unwrap();
        assert_eq!(summary.active_students, 2);
    }

    #[tokio::test]
    async fn roster_is_ordered_by_display_name() {
        let store = Arc::new(MemoryStore::new());
        enroll(&store, "s1", "Zoya", &["c1"]);
        enroll(&store, "s2", "Arjun", &["c1"]);
        let roster = aggregator(&store).roster("c1").await.unwrap();
        assert_eq!(roster, vec!["s2", "s1"]);
    }

    #[tokio::test]
    async fn enroll_creates_and_extends_users() {
        let store = Arc::new(MemoryStore::new());
        let agg = aggregator(&store);

        agg.enroll("s1", "Asha", "c1").await.unwrap();
        agg.enroll("s1", "ignored", "c2").await.unwrap();
        agg.enroll("s1", "ignored", "c2").await.unwrap();

        assert_eq!(agg.roster("c1").await.unwrap(), vec!["s1"]);
        assert_eq!(agg.roster("c2").await.unwrap(), vec!["s1"]);

        let user = store
            .get(&DocumentKey::new(collections::USERS, "s1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.fields.get("displayName"), Some(&FieldValue::from("Asha")));
        assert_eq!(
            user.fields.get("classes").and_then(FieldValue::as_array).map(<[_]>::len),
            Some(2)
        );
    }
}
