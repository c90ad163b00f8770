//! Class-level aggregate statistics.
//!
//! The fold here is pure: it receives the records already fetched for a
//! roster and the instant of computation, and builds the summary that the
//! aggregator persists.

use chrono::{DateTime, Duration, Utc};

use crate::model::{ClassSummary, ProgressRecord};

/// Inputs to [`summarize`] that are constant across a deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryParams {
    /// Trailing window in which a student counts as active.
    pub active_window: Duration,
    /// Assignments assumed per student when computing the completion rate.
    pub assumed_assignments: u32,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            active_window: Duration::days(7),
            assumed_assignments: 10,
        }
    }
}

/// Whether a record's last activity falls strictly inside the window.
///
/// A window reaching past the earliest representable instant covers every
/// record.
pub fn is_active(record: &ProgressRecord, now: DateTime<Utc>, window: Duration) -> bool {
    match now.checked_sub_signed(window) {
        Some(cutoff) => record.last_active > cutoff,
        None => true,
    }
}

/// Fold progress records into a class summary.
///
/// `roster_size` counts every enrolled student; `records` holds only the
/// students that have a progress record, so averages may be taken over
/// fewer students than the roster.
pub fn summarize(
    class_id: &str,
    roster_size: usize,
    records: &[ProgressRecord],
    now: DateTime<Utc>,
    params: &SummaryParams,
) -> ClassSummary {
    let active = records
        .iter()
        .filter(|r| is_active(r, now, params.active_window))
        .count();

    let (average_grade, completion_rate) = if records.is_empty() {
        (0.0, 0.0)
    } else {
        let n = records.len() as f64;
        let grade_sum: f64 = records.iter().map(|r| r.average_grade).sum();
        let completed: u64 = records
            .iter()
            .map(|r| u64::from(r.assignments_completed))
            .sum();
        let expected = n * f64::from(params.assumed_assignments);
        let rate = if expected > 0.0 {
            completed as f64 / expected
        } else {
            0.0
        };
        (grade_sum / n, rate)
    };

    ClassSummary {
        class_id: class_id.to_string(),
        total_students: saturating_u32(roster_size),
        active_students: saturating_u32(active),
        average_grade,
        completion_rate,
        last_updated: now,
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
