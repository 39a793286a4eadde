//! Error types for corag.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! provider, prompt and serialization errors, plus the four failures that
//! terminate an orchestration run (classification, retrieval, generation,
//! loop bound).

use thiserror::Error;

/// Unified error type for corag.
///
/// All fallible functions return `Result<T, AppError>`.
/// A negative classifier verdict is never an error; it drives a transition.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raw LLM provider errors, before a stage maps them
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller supplied an unusable input (e.g. an empty question)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A classifier call errored or returned a value outside its domain
    #[error("Classification failure: {0}")]
    Classification(String),

    /// Knowledge-base or web-search call errored
    #[error("Retrieval failure: {0}")]
    Retrieval(String),

    /// Answer generation call errored
    #[error("Generation failure: {0}")]
    Generation(String),

    /// The feedback loop exceeded its configured number of re-entries
    #[error("Loop bound exceeded: {limit} feedback re-entries allowed, next was into {stage}")]
    LoopBoundExceeded { limit: u32, stage: String },
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
