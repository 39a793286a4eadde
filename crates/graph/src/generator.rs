//! Answer generation from evidence.

use crate::prompted::{categorize, PromptedCall};
use corag_core::{AppError, AppResult};
use corag_knowledge::{join_contents, Evidence};

/// Produces a candidate answer from a question and an evidence set.
///
/// One invocation is one attempt; nothing is retried here.
#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, evidence: &[Evidence]) -> AppResult<String>;
}

/// Model-backed generator using the `generate.answer` prompt.
pub struct LlmAnswerGenerator {
    call: PromptedCall,
}

impl LlmAnswerGenerator {
    pub fn new(call: PromptedCall) -> Self {
        Self { call }
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, question: &str, evidence: &[Evidence]) -> AppResult<String> {
        let context = join_contents(evidence);
        let answer = self
            .call
            .invoke(&[("question", question), ("context", &context)])
            .await
            .map_err(|e| categorize(e, AppError::Generation))?;

        tracing::debug!(
            evidence = evidence.len(),
            answer_len = answer.len(),
            "Generated candidate answer"
        );
        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::{prompted, ScriptedLlm};
    use corag_knowledge::EvidenceSource;
    use corag_prompt::GENERATE_ANSWER;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_context_goes_into_system_prompt() {
        let llm = Arc::new(ScriptedLlm::replies(&["  He drank hemlock.\n"]));
        let generator = LlmAnswerGenerator::new(prompted(llm.clone(), GENERATE_ANSWER));
        let evidence = vec![
            Evidence::new("Socrates was sentenced to death.", EvidenceSource::KnowledgeBase),
            Evidence::new("The sentence was carried out with hemlock.", EvidenceSource::Web),
        ];

        let answer = generator.generate("How did Socrates die?", &evidence).await.unwrap();
        assert_eq!(answer, "He drank hemlock.");

        let request = &llm.requests()[0];
        let system = request.system.as_deref().unwrap();
        assert!(system.contains("Socrates was sentenced to death."));
        assert!(system.contains("carried out with hemlock"));
        assert_eq!(request.format, corag_llm::ResponseFormat::Text);
    }

    #[tokio::test]
    async fn test_provider_error_is_generation_failure() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(AppError::Llm("timeout".to_string()))]));
        let generator = LlmAnswerGenerator::new(prompted(llm, GENERATE_ANSWER));
        assert!(matches!(
            generator.generate("q", &[]).await,
            Err(AppError::Generation(_))
        ));
    }
}
