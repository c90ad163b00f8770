//! Class roster and summary commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use gurukul_core::model::ClassSummary;

use super::Session;

pub async fn enroll(
    config: Option<PathBuf>,
    student: String,
    name: String,
    class: String,
) -> Result<()> {
    let session = Session::open(config)?;
    session.aggregator().enroll(&student, &name, &class).await?;
    session.persist()?;
    println!("Enrolled {student} in {class}");
    Ok(())
}

pub async fn refresh(config: Option<PathBuf>, class: String) -> Result<()> {
    let session = Session::open(config)?;
    let summary = session.aggregator().refresh_class_summary(&class).await?;
    session.persist()?;

    println!("Refreshed summary for {class}");
    print_summary(&summary);
    Ok(())
}

pub async fn summary(config: Option<PathBuf>, class: String, json: bool) -> Result<()> {
    let session = Session::open(config)?;
    let Some(summary) = session.aggregator().class_summary(&class).await? else {
        println!("No summary stored for {class}. Run `gurukul refresh --class {class}` first.");
        return Ok(());
    };

    if json {
        let text = serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
        println!("{text}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &ClassSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        "Students",
        "Active",
        "Average Grade",
        "Completion",
        "Updated",
    ]);
    table.add_row(vec![
        Cell::new(summary.total_students),
        Cell::new(summary.active_students),
        Cell::new(format!("{:.1}", summary.average_grade)),
        Cell::new(format!("{:.1}%", summary.completion_rate * 100.0)),
        Cell::new(summary.last_updated.format("%Y-%m-%d %H:%M UTC")),
    ]);
    println!("{table}");
}
