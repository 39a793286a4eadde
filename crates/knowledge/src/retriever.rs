//! Knowledge-base retrieval.

use crate::embeddings::EmbeddingProvider;
use crate::types::Evidence;
use crate::vector_index::VectorIndex;
use corag_core::{AppError, AppResult};
use std::sync::Arc;

/// Fetches candidate evidence for a question from the knowledge base.
///
/// An empty result is valid: the question simply has no matching passages.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> AppResult<Vec<Evidence>>;
}

/// Retriever backed by a query embedder and a vector index.
pub struct VectorRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
    min_score: Option<f32>,
}

impl VectorRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
    ) -> AppResult<Self> {
        if embedder.dimensions() != index.dimensions() {
            return Err(AppError::Config(format!(
                "Embedder '{}' produces {} dimensions but the index holds {}",
                embedder.model_name(),
                embedder.dimensions(),
                index.dimensions()
            )));
        }

        Ok(Self {
            embedder,
            index,
            top_k,
            min_score: None,
        })
    }

    /// Drop passages scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }
}

/// Fold any failure from the embed/search path into the retrieval category.
fn as_retrieval_failure(err: AppError) -> AppError {
    match err {
        AppError::Retrieval(msg) => AppError::Retrieval(msg),
        other => AppError::Retrieval(other.to_string()),
    }
}

#[async_trait::async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, question: &str) -> AppResult<Vec<Evidence>> {
        let query = self
            .embedder
            .embed(question)
            .await
            .map_err(as_retrieval_failure)?;

        let results = self
            .index
            .search(&query, self.top_k)
            .await
            .map_err(as_retrieval_failure)?;

        let total = results.len();
        let evidence: Vec<Evidence> = results
            .into_iter()
            .filter(|(_, score)| self.min_score.map_or(true, |min| *score >= min))
            .map(|(evidence, score)| evidence.with_metadata("score", serde_json::json!(score)))
            .collect();

        tracing::debug!(
            kept = evidence.len(),
            total,
            "Retrieved {} passage(s) from the knowledge base",
            evidence.len()
        );

        Ok(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EvidenceSource;

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (norm(a) * norm(b))
    }

    #[derive(Debug)]
    struct FixedEmbedder {
        vector: Vec<f32>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        fn model_name(&self) -> &str {
            "fixed-v1"
        }

        fn dimensions(&self) -> usize {
            self.vector.len()
        }

        async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
            if self.fail {
                return Err(AppError::Llm("connection refused".to_string()));
            }
            Ok(self.vector.clone())
        }
    }

    struct MemoryIndex {
        rows: Vec<(&'static str, Vec<f32>)>,
    }

    #[async_trait::async_trait]
    impl VectorIndex for MemoryIndex {
        fn dimensions(&self) -> usize {
            2
        }

        async fn search(
            &self,
            query_embedding: &[f32],
            top_k: usize,
        ) -> AppResult<Vec<(Evidence, f32)>> {
            let mut scored: Vec<(Evidence, f32)> = self
                .rows
                .iter()
                .map(|(text, v)| {
                    (
                        Evidence::new(*text, EvidenceSource::KnowledgeBase),
                        cosine_similarity(query_embedding, v),
                    )
                })
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
            scored.truncate(top_k);
            Ok(scored)
        }
    }

    fn index() -> Arc<dyn VectorIndex> {
        Arc::new(MemoryIndex {
            rows: vec![
                ("hemlock", vec![1.0, 0.0]),
                ("academy", vec![0.0, 1.0]),
                ("lyceum", vec![0.6, 0.8]),
            ],
        })
    }

    fn embedder(vector: Vec<f32>, fail: bool) -> Arc<dyn EmbeddingProvider> {
        Arc::new(FixedEmbedder { vector, fail })
    }

    #[tokio::test]
    async fn test_retrieve_top_k_with_scores() {
        let retriever = VectorRetriever::new(embedder(vec![1.0, 0.0], false), index(), 2).unwrap();
        let evidence = retriever.retrieve("How did Socrates die?").await.unwrap();

        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[0].content, "hemlock");
        assert_eq!(evidence[1].content, "lyceum");
        assert!(evidence[0].metadata["score"].as_f64().unwrap() > 0.99);
    }

    #[tokio::test]
    async fn test_min_score_can_empty_the_result() {
        let retriever = VectorRetriever::new(embedder(vec![-1.0, 0.0], false), index(), 3)
            .unwrap()
            .with_min_score(Some(0.5));
        let evidence = retriever.retrieve("unrelated").await.unwrap();
        assert!(evidence.is_empty());
    }

    #[tokio::test]
    async fn test_embed_failure_is_retrieval_failure() {
        let retriever = VectorRetriever::new(embedder(vec![1.0, 0.0], true), index(), 2).unwrap();
        let err = retriever.retrieve("q").await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let result = VectorRetriever::new(embedder(vec![1.0, 0.0, 0.0], false), index(), 2);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
