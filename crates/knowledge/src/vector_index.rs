//! Vector index abstraction.
//!
//! The index is built by an offline ingestion job; this crate only queries
//! it, so the trait is search-only.

use crate::types::Evidence;
use corag_core::AppResult;

/// Trait for read-only vector index backends.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embedding dimension the index was built with.
    fn dimensions(&self) -> usize;

    /// Search for the top-k most similar passages to the query embedding.
    ///
    /// Passages are selected and scored by cosine similarity, so the score
    /// does not depend on vector length. Results come back ordered by
    /// descending score.
    async fn search(&self, query_embedding: &[f32], top_k: usize)
        -> AppResult<Vec<(Evidence, f32)>>;
}
