//! Ollama embedding provider.
//!
//! Calls the local Ollama `/api/embeddings` endpoint with a model such as
//! `nomic-embed-text`. The returned vector length is checked against the
//! configured dimensions so a mismatched model fails loudly instead of
//! producing meaningless similarity scores.

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use corag_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Ollama embedding provider using the local API.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaEmbedder {
    /// Create a provider for `model` at `base_url` (default local Ollama).
    pub fn new(base_url: Option<&str>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url
                .unwrap_or(DEFAULT_OLLAMA_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.into(),
            dimensions,
        }
    }

    fn check_dimensions(&self, embedding: Vec<f32>) -> AppResult<Vec<f32>> {
        if embedding.len() != self.dimensions {
            return Err(AppError::Retrieval(format!(
                "Embedding model '{}' returned {} dimensions, expected {}",
                self.model,
                embedding.len(),
                self.dimensions
            )));
        }
        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput("Cannot embed empty text".to_string()));
        }

        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to reach Ollama at {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|r| r.error)
                .unwrap_or(error_text);

            return Err(AppError::Retrieval(format!(
                "Ollama embedding error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Retrieval(format!("Failed to parse Ollama embedding response: {}", e))
        })?;

        self.check_dimensions(body.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let embedder = OllamaEmbedder::new(None, "nomic-embed-text", 768);
        assert_eq!(embedder.base_url, DEFAULT_OLLAMA_URL);
        assert_eq!(embedder.provider_name(), "ollama");
        assert_eq!(embedder.model_name(), "nomic-embed-text");
        assert_eq!(embedder.dimensions(), 768);
    }

    #[test]
    fn test_custom_url_trimmed() {
        let embedder = OllamaEmbedder::new(Some("http://gpu-box:11434/"), "m", 4);
        assert_eq!(embedder.base_url, "http://gpu-box:11434");
    }

    #[test]
    fn test_dimension_mismatch_is_retrieval_failure() {
        let embedder = OllamaEmbedder::new(None, "nomic-embed-text", 3);
        assert!(embedder.check_dimensions(vec![0.1, 0.2, 0.3]).is_ok());
        assert!(matches!(
            embedder.check_dimensions(vec![0.1]),
            Err(AppError::Retrieval(_))
        ));
    }

    #[test]
    fn test_response_parsing() {
        let body: EmbeddingResponse =
            serde_json::from_str(r#"{"embedding":[0.5,-0.25]}"#).unwrap();
        assert_eq!(body.embedding, vec![0.5, -0.25]);

        let err: ErrorResponse =
            serde_json::from_str(r#"{"error":"model 'x' not found"}"#).unwrap();
        assert!(err.error.contains("not found"));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let embedder = OllamaEmbedder::new(None, "nomic-embed-text", 768);
        assert!(matches!(
            embedder.embed("   ").await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
