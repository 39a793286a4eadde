//! Run state and stage definitions.

use corag_knowledge::Evidence;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node of the orchestration state machine.
///
/// Verification is not a stage: it is the transition function applied after
/// [`Stage::Generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Route,
    Retrieve,
    WebSearch,
    RelevanceFilter,
    Generate,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Route => "route",
            Stage::Retrieve => "retrieve",
            Stage::WebSearch => "web_search",
            Stage::RelevanceFilter => "relevance_filter",
            Stage::Generate => "generate",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Working record of one run. Owned by a single orchestration and dropped
/// when it ends.
#[derive(Debug, Clone)]
pub struct RunState {
    pub question: String,
    /// Relative order is preserved by filtering.
    pub evidence: Vec<Evidence>,
    pub candidate_answer: Option<String>,
    /// Set when the last filtering pass dropped at least one document.
    pub use_web_search: bool,
    pub correction_enabled: bool,
    pub answer_is_resolved: Option<bool>,
    /// Feedback re-entries taken so far.
    pub iteration_count: u32,
}

impl RunState {
    pub fn new(question: impl Into<String>, correction_enabled: bool) -> Self {
        Self {
            question: question.into(),
            evidence: Vec::new(),
            candidate_answer: None,
            use_web_search: false,
            correction_enabled,
            answer_is_resolved: None,
            iteration_count: 0,
        }
    }
}
