//! Period analytics reports with JSON persistence and Markdown rendering.

use std::fmt::Write;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::ClassAggregator;
use crate::error::{AnalyticsError, Result, StoreError};
use crate::events::{EventLog, ASSIGNMENT_SUBMISSION, DEFAULT_EVENT_LIMIT};
use crate::model::{AnalyticsEvent, ClassSummary};

/// Closed date range covered by a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// A class summary together with the submission events of a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub class_analytics: ClassSummary,
    pub period_events: Vec<AnalyticsEvent>,
    pub period: Period,
}

/// Build the report for a class over `[start, end]`.
///
/// The stored summary must already exist; it is not refreshed here.
/// Submission events are looked up with the class id as their user id,
/// which is how class-level submissions are logged.
pub async fn build_report(
    aggregator: &ClassAggregator,
    events: &EventLog,
    class_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<AnalyticsReport> {
    let class_analytics = aggregator.class_summary(class_id).await?.ok_or_else(|| {
        AnalyticsError::failed("build report")(StoreError::NotFound(
            ClassSummary::key(class_id).to_string(),
        ))
    })?;

    let period = Period { start, end };
    let period_events = events
        .user_events(class_id, Some(ASSIGNMENT_SUBMISSION), DEFAULT_EVENT_LIMIT)
        .await?
        .into_iter()
        .filter(|e| period.contains(e.created_at))
        .collect();

    Ok(AnalyticsReport {
        class_analytics,
        period_events,
        period,
    })
}

impl AnalyticsReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse report JSON")
    }

    /// Render the report as Markdown.
    pub fn to_markdown(&self) -> String {
        let summary = &self.class_analytics;
        let mut output = String::new();

        let _ = writeln!(output, "# Class Analytics Report: {}", summary.class_id);
        let _ = writeln!(
            output,
            "Period {} to {} (summary computed {})",
            self.period.start.format("%Y-%m-%d"),
            self.period.end.format("%Y-%m-%d"),
            summary.last_updated.format("%Y-%m-%d %H:%M UTC"),
        );
        let _ = writeln!(output);
        let _ = writeln!(output, "## Summary");
        let _ = writeln!(output, "- Students enrolled: {}", summary.total_students);
        let _ = writeln!(output, "- Active in the last week: {}", summary.active_students);
        let _ = writeln!(output, "- Average grade: {:.1}", summary.average_grade);
        let _ = writeln!(
            output,
            "- Completion rate: {:.1}%",
            summary.completion_rate * 100.0
        );
        let _ = writeln!(output);
        let _ = writeln!(output, "## Submissions");

        if self.period_events.is_empty() {
            let _ = writeln!(output, "No submissions recorded for this period.");
        } else {
            for event in &self.period_events {
                let _ = writeln!(
                    output,
                    "- {} `{}`",
                    event.created_at.format("%Y-%m-%d %H:%M"),
                    event.id
                );
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::aggregator::AggregatorConfig;
    use crate::memory::MemoryStore;
    use crate::model::Fields;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn report_requires_summary() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = ClassAggregator::new(store.clone(), &AggregatorConfig::default());
        let events = EventLog::new(store.clone());

        let err = build_report(&aggregator, &events, "c1", day(1), day(28))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn report_keeps_events_inside_period() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = ClassAggregator::new(store.clone(), &AggregatorConfig::default());
        let events = EventLog::new(store.clone());

        aggregator
            .refresh_class_summary_at("c1", day(20))
            .await
            .unwrap();
        for d in [2, 10, 15, 25] {
            events
                .log_event_at("c1", ASSIGNMENT_SUBMISSION, Fields::new(), day(d))
                .await
                .unwrap();
        }
        events
            .log_event_at("c1", "login", Fields::new(), day(12))
            .await
            .unwrap();

        let report = build_report(&aggregator, &events, "c1", day(10), day(15))
            .await
            .unwrap();
        assert_eq!(report.period_events.len(), 2);
        assert!(report
            .period_events
            .iter()
            .all(|e| e.event_type == ASSIGNMENT_SUBMISSION));

        let md = report.to_markdown();
        assert!(md.contains("# Class Analytics Report: c1"));
        assert!(md.contains("Period 2026-02-10 to 2026-02-15"));
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let period = Period {
            start: day(1),
            end: day(2),
        };
        assert!(period.contains(day(1)));
        assert!(period.contains(day(2)));
        assert!(!period.contains(day(2) + Duration::seconds(1)));
    }

    #[test]
    fn json_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.json");
        let report = AnalyticsReport {
            class_analytics: ClassSummary {
                class_id: "c1".into(),
                total_students: 2,
                active_students: 1,
                average_grade: 72.5,
                completion_rate: 0.4,
                last_updated: day(3),
            },
            period_events: vec![],
            period: Period {
                start: day(1),
                end: day(3),
            },
        };
        report.save_json(&path).unwrap();
        let loaded = AnalyticsReport::load_json(&path).unwrap();
        assert_eq!(loaded.class_analytics, report.class_analytics);
        assert!(report.to_markdown().contains("No submissions recorded"));
    }
}
