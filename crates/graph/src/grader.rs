//! Per-document relevance grading.

use crate::prompted::{categorize, PromptedCall};
use crate::verdict::parse_binary_score;
use corag_core::{AppError, AppResult};
use corag_knowledge::Evidence;

/// Binary relevance classifier for one evidence document.
#[async_trait::async_trait]
pub trait DocumentGrader: Send + Sync {
    async fn is_relevant(&self, question: &str, document: &Evidence) -> AppResult<bool>;
}

/// Model-backed grader using the `grade.document` prompt.
pub struct LlmDocumentGrader {
    call: PromptedCall,
}

impl LlmDocumentGrader {
    pub fn new(call: PromptedCall) -> Self {
        Self { call }
    }
}

#[async_trait::async_trait]
impl DocumentGrader for LlmDocumentGrader {
    async fn is_relevant(&self, question: &str, document: &Evidence) -> AppResult<bool> {
        let raw = self
            .call
            .invoke(&[("question", question), ("document", &document.content)])
            .await
            .map_err(|e| categorize(e, AppError::Classification))?;

        let relevant = parse_binary_score(&raw)?;
        tracing::debug!(relevant, "Document relevance verdict");
        Ok(relevant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::{prompted, ScriptedLlm};
    use corag_knowledge::EvidenceSource;
    use corag_prompt::GRADE_DOCUMENT;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_grades_document() {
        let llm = Arc::new(ScriptedLlm::replies(&[r#"{"binary_score": "no"}"#]));
        let grader = LlmDocumentGrader::new(prompted(llm.clone(), GRADE_DOCUMENT));
        let doc = Evidence::new("The Republic, Book VII", EvidenceSource::KnowledgeBase);

        assert!(!grader.is_relevant("Who won the 2022 World Cup?", &doc).await.unwrap());
        assert!(llm.requests()[0].prompt.contains("The Republic, Book VII"));
    }
}
