//! Ask command handler.
//!
//! Runs one question through the corrective retrieval pipeline.

use clap::Args;
use corag_core::{config::AppConfig, AppError, AppResult};
use corag_graph::{build_orchestrator, RunOutcome};
use std::path::PathBuf;

/// Answer a question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Grade retrieved documents and fall back to web search when any is irrelevant
    #[arg(long)]
    pub correction: bool,

    /// Maximum feedback re-entries before the run fails
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Output the answer, evidence and run details as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let question = self.question_text()?;

        let mut config = config.clone();
        if let Some(max_iterations) = self.max_iterations {
            config.pipeline.max_iterations = max_iterations;
        }
        config.validate()?;

        let correction = self.correction || config.pipeline.correction;
        tracing::debug!(
            correction,
            max_iterations = config.pipeline.max_iterations,
            "Ask command options"
        );

        let orchestrator = build_orchestrator(&config).await?;
        let outcome = orchestrator.answer(&question, correction).await?;

        if self.json {
            println!("{}", render_json(&outcome, &config)?);
        } else {
            println!("{}", outcome.answer);
            if !outcome.answer_found {
                tracing::warn!("The sources did not contain an answer to this question");
            }
        }

        Ok(())
    }

    /// Get the question from the argument or the file.
    fn question_text(&self) -> AppResult<String> {
        if let Some(ref question) = self.question {
            return Ok(question.clone());
        }

        if let Some(ref path) = self.file {
            return std::fs::read_to_string(path).map_err(|e| {
                AppError::InvalidInput(format!("Failed to read question file {:?}: {}", path, e))
            });
        }

        Err(AppError::InvalidInput("No question provided".to_string()))
    }
}

fn render_json(outcome: &RunOutcome, config: &AppConfig) -> AppResult<String> {
    let output = serde_json::json!({
        "question": outcome.question,
        "answer": outcome.answer,
        "answerFound": outcome.answer_found,
        "evidence": outcome.evidence,
        "metadata": {
            "provider": config.provider,
            "model": config.model,
            "iterations": outcome.iterations,
            "stages": outcome.stages,
        }
    });

    Ok(serde_json::to_string_pretty(&output)?)
}
