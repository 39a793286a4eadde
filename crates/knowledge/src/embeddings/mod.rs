//! Query embedding for vector retrieval.
//!
//! Embeddings are computed by an external service; this module only defines
//! the provider seam and an Ollama implementation of it.

pub mod provider;
pub mod providers;

pub use provider::EmbeddingProvider;
pub use providers::ollama::OllamaEmbedder;
