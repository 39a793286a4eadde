//! Adaptive corrective retrieval for corag.
//!
//! The [`Orchestrator`] routes a question to the knowledge base or the web,
//! optionally filters retrieved evidence, generates an answer and gates it
//! on groundedness and relevance. Every decision comes from a pluggable
//! collaborator; the orchestrator only wires them and bounds the feedback
//! loops.

pub mod answer_check;
pub mod deadline;
pub mod factory;
pub mod filter;
pub mod generator;
pub mod grader;
pub mod groundedness;
pub mod orchestrator;
pub mod prompted;
pub mod router;
pub mod state;
pub mod verdict;

#[cfg(test)]
mod tests;

pub use answer_check::{AnswerChecker, LlmAnswerChecker};
pub use factory::build_orchestrator;
pub use filter::{FilterOutcome, RelevanceFilter};
pub use generator::{AnswerGenerator, LlmAnswerGenerator};
pub use grader::{DocumentGrader, LlmDocumentGrader};
pub use groundedness::{GroundednessChecker, LlmGroundednessChecker};
pub use orchestrator::{Components, Orchestrator, OrchestratorConfig, RunOutcome};
pub use prompted::PromptedCall;
pub use router::{LlmQueryRouter, QueryRouter};
pub use state::{RunState, Stage};
pub use verdict::Route;
