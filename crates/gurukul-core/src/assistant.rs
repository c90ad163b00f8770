//! Prompt builders for the teaching assistant features.
//!
//! Each operation formats a prompt, sends it to the configured
//! [`TextGenerator`], and substitutes a fixed apology when the generator
//! returns no text.

use std::sync::Arc;

use anyhow::Result;

use crate::traits::{GenerateRequest, TextGenerator};

const GRADING_TEMPERATURE: f64 = 0.2;
const CREATIVE_TEMPERATURE: f64 = 0.7;

pub const CHAT_FALLBACK: &str = "Sorry, I couldn't generate a response. Please try again.";
pub const CONTENT_FALLBACK: &str = "Sorry, I couldn't generate learning content. Please try again.";
pub const QUIZ_FALLBACK: &str = "Sorry, I couldn't generate quiz questions. Please try again.";

/// Prompt for grading a submission, asking for a score out of 100.
pub fn grading_prompt(assignment_kind: &str, submission: &str, rubric: Option<&str>) -> String {
    let rubric = rubric
        .map(|r| format!("Please use the following rubric for grading: {r}\n\n"))
        .unwrap_or_default();
    format!(
        "As an AI-powered grading assistant, please evaluate the following {assignment_kind} submission:\n\n\
         {submission}\n\n\
         {rubric}\
         Provide:\n\
         1. A numerical score (out of 100)\n\
         2. Detailed feedback highlighting strengths\n\
         3. Areas for improvement\n\
         4. Specific suggestions for enhancement\n\
         5. A brief summary of the evaluation\n\n\
         Format the response clearly with sections for each component of the feedback."
    )
}

pub fn learning_content_prompt(topic: &str, level: &str, style: &str) -> String {
    format!(
        "Create personalized learning content about \"{topic}\" for a student at {level} level \
         who learns best through {style}.\n\n\
         Include:\n\
         1. A brief introduction to the topic\n\
         2. Key concepts explained in a way that matches the student's learning style\n\
         3. 2-3 engaging examples or exercises\n\
         4. A summary of the most important points to remember\n\n\
         Format the content in a clear, structured way that's easy to follow."
    )
}

pub fn quiz_prompt(topic: &str, difficulty: &str, count: u32) -> String {
    format!(
        "Generate {count} multiple-choice quiz questions about \"{topic}\" at {difficulty} \
         difficulty level.\n\n\
         For each question:\n\
         1. Provide a clear question\n\
         2. Include 4 possible answers (labeled A, B, C, D)\n\
         3. Mark the correct answer\n\
         4. Add a brief explanation of why the answer is correct\n\n\
         Format each question as a standalone section with clear separation."
    )
}

/// Generative-text features for teachers and students.
#[derive(Clone)]
pub struct Assistant {
    generator: Arc<dyn TextGenerator>,
}

impl Assistant {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    async fn complete(&self, prompt: String, temperature: f64, fallback: &str) -> Result<String> {
        let response = self
            .generator
            .generate(&GenerateRequest::new(prompt, temperature))
            .await?;
        tracing::debug!(
            generator = self.generator.name(),
            model = %response.model,
            latency_ms = response.latency_ms,
            "generation complete"
        );
        if response.text.trim().is_empty() {
            Ok(fallback.to_string())
        } else {
            Ok(response.text)
        }
    }

    /// Free-form prompt, as typed by the user.
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        self.complete(prompt.to_string(), CREATIVE_TEMPERATURE, CHAT_FALLBACK)
            .await
    }

    /// Feedback on a submission, expected to include a score out of 100.
    pub async fn grade_submission(
        &self,
        assignment_kind: &str,
        submission: &str,
        rubric: Option<&str>,
    ) -> Result<String> {
        self.complete(
            grading_prompt(assignment_kind, submission, rubric),
            GRADING_TEMPERATURE,
            CHAT_FALLBACK,
        )
        .await
    }

    pub async fn learning_content(&self, topic: &str, level: &str, style: &str) -> Result<String> {
        self.complete(
            learning_content_prompt(topic, level, style),
            CREATIVE_TEMPERATURE,
            CONTENT_FALLBACK,
        )
        .await
    }

    pub async fn quiz_questions(&self, topic: &str, difficulty: &str, count: u32) -> Result<String> {
        self.complete(
            quiz_prompt(topic, difficulty, count),
            CREATIVE_TEMPERATURE,
            QUIZ_FALLBACK,
        )
        .await
    }
}
