//! Submission and grading commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use gurukul_core::grading::{extract_score, submit_assignment, AutoGrader};

use super::{generate, Session};

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub async fn submit(
    config: Option<PathBuf>,
    assignment: String,
    student: String,
    file: PathBuf,
) -> Result<()> {
    let content = read_text(&file)?;
    let session = Session::open(config)?;
    let id = submit_assignment(
        session.store().as_ref(),
        &assignment,
        &student,
        &content,
        Utc::now(),
    )
    .await?;
    session.persist()?;
    println!("Submitted {assignment} for {student}: {id}");
    Ok(())
}

pub async fn grade(
    config: Option<PathBuf>,
    kind: String,
    file: PathBuf,
    rubric: Option<PathBuf>,
) -> Result<()> {
    let work = read_text(&file)?;
    let rubric = rubric.as_deref().map(read_text).transpose()?;

    let session = Session::open(config)?;
    let assistant = session.assistant()?;
    let feedback = generate(
        "Grading",
        assistant.grade_submission(&kind, &work, rubric.as_deref()),
    )
    .await?;

    println!("{feedback}");
    match extract_score(&feedback) {
        Some(score) => println!("\nExtracted score: {score}"),
        None => println!("\nNo score found in feedback."),
    }
    Ok(())
}

pub async fn auto_grade(config: Option<PathBuf>, submission: String, kind: String) -> Result<()> {
    let session = Session::open(config)?;
    let grader = AutoGrader::new(session.store(), session.assistant()?);
    let outcome = generate("Grading", async {
        grader
            .auto_grade(&submission, &kind)
            .await
            .map_err(anyhow::Error::from)
    })
    .await?;
    session.persist()?;

    println!("{}", outcome.feedback);
    println!(
        "\nStored grade {} for submission {}",
        outcome.grade, outcome.submission_id
    );
    Ok(())
}
