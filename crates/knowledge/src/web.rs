//! Web search evidence source.
//!
//! Tavily API: https://docs.tavily.com/documentation/api-reference/endpoint/search

use crate::types::{Evidence, EvidenceSource};
use corag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com/search";

/// Fetches candidate evidence for a question from a live web search provider.
///
/// Every returned document is marked as web-sourced. Failures are not
/// retried here; the caller decides.
#[async_trait::async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, question: &str) -> AppResult<Vec<Evidence>>;
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    content: String,
    #[serde(default)]
    score: Option<f64>,
}

/// Tavily search client.
pub struct TavilySearcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
}

impl TavilySearcher {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, max_results: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            max_results,
        }
    }

    fn to_evidence(response: TavilyResponse) -> Vec<Evidence> {
        response
            .results
            .into_iter()
            .filter(|r| !r.content.trim().is_empty())
            .map(|r| {
                let mut evidence = Evidence::new(r.content, EvidenceSource::Web);
                if let Some(title) = r.title {
                    evidence = evidence.with_metadata("title", title.into());
                }
                if let Some(url) = r.url {
                    evidence = evidence.with_metadata("url", url.into());
                }
                if let Some(score) = r.score {
                    evidence = evidence.with_metadata("score", serde_json::json!(score));
                }
                evidence
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, question: &str) -> AppResult<Vec<Evidence>> {
        tracing::debug!(max_results = self.max_results, "Sending web search request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&TavilyRequest {
                query: question,
                max_results: self.max_results,
                search_depth: "basic",
            })
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to send web search request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "Web search API error ({}): {}",
                status, error_text
            )));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse web search response: {}", e)))?;

        let evidence = Self::to_evidence(body);
        tracing::debug!("Web search returned {} document(s)", evidence.len());

        Ok(evidence)
    }
}
