//! Evidence sources for corag.
//!
//! Two collaborators feed the orchestrator with evidence:
//! - [`Retriever`]: top-k passages from a read-only LanceDB index, queried
//!   with an externally computed embedding
//! - [`WebSearcher`]: live web results (Tavily)
//!
//! Index construction and document ingestion happen elsewhere.

pub mod embeddings;
pub mod lancedb_index;
pub mod retriever;
pub mod types;
pub mod vector_index;
pub mod web;

pub use embeddings::{EmbeddingProvider, OllamaEmbedder};
pub use lancedb_index::LanceDbIndex;
pub use retriever::{Retriever, VectorRetriever};
pub use types::{join_contents, Evidence, EvidenceSource};
pub use vector_index::VectorIndex;
pub use web::{TavilySearcher, WebSearcher, DEFAULT_TAVILY_URL};
