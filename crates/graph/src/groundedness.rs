//! Groundedness gate: is the answer supported by the evidence?

use crate::prompted::{categorize, PromptedCall};
use crate::verdict::parse_binary_score;
use corag_core::{AppError, AppResult};
use corag_knowledge::{join_contents, Evidence};

/// Strict classifier: every claim must be traceable to the evidence.
#[async_trait::async_trait]
pub trait GroundednessChecker: Send + Sync {
    async fn is_grounded(&self, question: &str, answer: &str, evidence: &[Evidence])
        -> AppResult<bool>;
}

/// Model-backed checker using the `grade.groundedness` prompt.
pub struct LlmGroundednessChecker {
    call: PromptedCall,
}

impl LlmGroundednessChecker {
    pub fn new(call: PromptedCall) -> Self {
        Self { call }
    }
}

#[async_trait::async_trait]
impl GroundednessChecker for LlmGroundednessChecker {
    async fn is_grounded(
        &self,
        question: &str,
        answer: &str,
        evidence: &[Evidence],
    ) -> AppResult<bool> {
        let documents = join_contents(evidence);
        let raw = self
            .call
            .invoke(&[
                ("question", question),
                ("documents", &documents),
                ("generation", answer),
            ])
            .await
            .map_err(|e| categorize(e, AppError::Classification))?;

        let grounded = parse_binary_score(&raw)?;
        tracing::debug!(grounded, "Groundedness verdict");
        Ok(grounded)
    }
}
