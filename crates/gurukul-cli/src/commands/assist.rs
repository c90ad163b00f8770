//! The `gurukul chat`, `gurukul content` and `gurukul quiz` commands.

use std::path::PathBuf;

use anyhow::Result;

use super::{generate, Session};

pub async fn chat(config: Option<PathBuf>, prompt: String) -> Result<()> {
    anyhow::ensure!(!prompt.trim().is_empty(), "prompt must not be empty");
    let assistant = Session::open(config)?.assistant()?;
    let label = format!("Asking {}", assistant.generator_name());
    let text = generate(&label, assistant.chat(&prompt)).await?;
    println!("{text}");
    Ok(())
}

pub async fn content(
    config: Option<PathBuf>,
    topic: String,
    level: String,
    style: String,
) -> Result<()> {
    let assistant = Session::open(config)?.assistant()?;
    let text = generate(
        "Generating content",
        assistant.learning_content(&topic, &level, &style),
    )
    .await?;
    println!("{text}");
    Ok(())
}

pub async fn quiz(
    config: Option<PathBuf>,
    topic: String,
    difficulty: String,
    count: u32,
) -> Result<()> {
    anyhow::ensure!(count >= 1, "count must be at least 1");
    let assistant = Session::open(config)?.assistant()?;
    let text = generate(
        "Generating quiz",
        assistant.quiz_questions(&topic, &difficulty, count),
    )
    .await?;
    println!("{text}");
    Ok(())
}
