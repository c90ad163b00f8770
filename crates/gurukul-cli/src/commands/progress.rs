//! The `gurukul record` and `gurukul progress` commands.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use gurukul_core::model::ProgressRecord;

use super::Session;

pub async fn record(
    config: Option<PathBuf>,
    student: String,
    class: String,
    completed: bool,
    grade: Option<f64>,
) -> Result<()> {
    if let Some(g) = grade {
        anyhow::ensure!(g.is_finite(), "grade must be a finite number");
    }

    let session = Session::open(config)?;
    let record = session
        .tracker()
        .record_progress(&student, &class, completed, grade)
        .await?;
    session.persist()?;

    println!("Recorded progress for {student} in {class}");
    print_record(&record);
    Ok(())
}

pub async fn show(config: Option<PathBuf>, student: String, class: String) -> Result<()> {
    let session = Session::open(config)?;
    match session.tracker().progress(&student, &class).await? {
        Some(record) => print_record(&record),
        None => println!("No progress recorded for {student} in {class}."),
    }
    Ok(())
}

fn print_record(record: &ProgressRecord) {
    let mut table = Table::new();
    table.set_header(vec!["Completed", "Average Grade", "Last Active"]);
    table.add_row(vec![
        Cell::new(record.assignments_completed),
        Cell::new(format!("{:.1}", record.average_grade)),
        Cell::new(record.last_active.format("%Y-%m-%d %H:%M UTC")),
    ]);
    println!("{table}");
}
