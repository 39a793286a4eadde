//! Answer relevance gate: does the answer address the question?

use crate::prompted::{categorize, PromptedCall};
use crate::verdict::parse_binary_score;
use corag_core::{AppError, AppResult};

/// Lenient classifier: an on-topic attempt passes even if partial.
#[async_trait::async_trait]
pub trait AnswerChecker: Send + Sync {
    async fn answers_question(&self, question: &str, answer: &str) -> AppResult<bool>;
}

/// Model-backed checker using the `grade.answer` prompt.
pub struct LlmAnswerChecker {
    call: PromptedCall,
}

impl LlmAnswerChecker {
    pub fn new(call: PromptedCall) -> Self {
        Self { call }
    }
}

#[async_trait::async_trait]
impl AnswerChecker for LlmAnswerChecker {
    async fn answers_question(&self, question: &str, answer: &str) -> AppResult<bool> {
        let raw = self
            .call
            .invoke(&[("question", question), ("generation", answer)])
            .await
            .map_err(|e| categorize(e, AppError::Classification))?;

        let addresses = parse_binary_score(&raw)?;
        tracing::debug!(addresses, "Answer relevance verdict");
        Ok(addresses)
    }
}
