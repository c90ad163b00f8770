//! The `gurukul report` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use gurukul_core::report::build_report;

use super::Session;

pub async fn execute(
    config: Option<PathBuf>,
    class: String,
    start: String,
    end: String,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let start = parse_instant(&start, false)?;
    let end = parse_instant(&end, true)?;
    anyhow::ensure!(start <= end, "report start must not be after its end");
    anyhow::ensure!(
        matches!(format.as_str(), "markdown" | "json"),
        "unknown format `{format}` (expected markdown or json)"
    );

    let session = Session::open(config)?;
    let report = build_report(
        &session.aggregator(),
        &session.events(),
        &class,
        start,
        end,
    )
    .await?;

    match (format.as_str(), output) {
        ("json", Some(path)) => {
            report.save_json(&path)?;
            println!("Report written to {}", path.display());
        }
        ("json", None) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        }
        (_, Some(path)) => {
            std::fs::write(&path, report.to_markdown())
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        (_, None) => print!("{}", report.to_markdown()),
    }
    Ok(())
}

/// Accept RFC 3339 instants or bare dates. A bare date covers the whole
/// day, so an end date resolves to its last second.
fn parse_instant(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date `{raw}` (expected YYYY-MM-DD or RFC 3339)"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .context("invalid time of day")?;
    Ok(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bare_dates_cover_whole_days() {
        assert_eq!(
            parse_instant("2026-05-01", false).unwrap(),
            Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2026-05-01", true).unwrap(),
            Utc.with_ymd_and_hms(2026, 5, 1, 23, 59, 59).unwrap()
        );
    }

    #[test]
    fn rfc3339_is_converted_to_utc() {
        assert_eq!(
            parse_instant("2026-05-01T10:00:00+05:30", true).unwrap(),
            Utc.with_ymd_and_hms(2026, 5, 1, 4, 30, 0).unwrap()
        );
    }

    #[test]
    fn garbage_is_rejected() {
        let err = parse_instant("last week", false).unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }
}
