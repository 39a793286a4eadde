//! Normalization of raw classifier output.
//!
//! Models are asked for a JSON object. Binary classifiers may answer with a
//! boolean or a "yes"/"no" string; the router names a data source. Anything
//! outside those domains is a classification failure, never a default.

use corag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entry branch chosen by the query router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    KnowledgeBase,
    WebSearch,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::KnowledgeBase => f.write_str("knowledge_base"),
            Route::WebSearch => f.write_str("web_search"),
        }
    }
}

/// Strip a surrounding markdown code fence, if the model added one.
fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_object(raw: &str) -> AppResult<serde_json::Map<String, serde_json::Value>> {
    match serde_json::from_str::<serde_json::Value>(strip_fence(raw)) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::Classification(format!(
            "Expected a JSON object, got: {}",
            other
        ))),
        Err(e) => Err(AppError::Classification(format!(
            "Classifier output is not JSON ({}): {}",
            e,
            raw.trim()
        ))),
    }
}

/// Parse `{"binary_score": ...}` into a boolean.
pub fn parse_binary_score(raw: &str) -> AppResult<bool> {
    let map = parse_object(raw)?;
    let value = map.get("binary_score").ok_or_else(|| {
        AppError::Classification(format!("Missing 'binary_score' in: {}", raw.trim()))
    })?;

    match value {
        serde_json::Value::Bool(b) => Ok(*b),
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Ok(true),
            "no" | "false" => Ok(false),
            other => Err(AppError::Classification(format!(
                "binary_score '{}' is neither yes nor no",
                other
            ))),
        },
        other => Err(AppError::Classification(format!(
            "binary_score has unsupported value: {}",
            other
        ))),
    }
}

/// Parse `{"datasource": ...}` into a [`Route`].
pub fn parse_route(raw: &str) -> AppResult<Route> {
    let map = parse_object(raw)?;
    let datasource = map
        .get("datasource")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            AppError::Classification(format!("Missing 'datasource' in: {}", raw.trim()))
        })?;

    match datasource.trim().to_ascii_lowercase().as_str() {
        "vectorstore" | "vector_store" | "knowledge_base" => Ok(Route::KnowledgeBase),
        "web_search" | "websearch" => Ok(Route::WebSearch),
        other => Err(AppError::Classification(format!(
            "Unknown datasource '{}'",
            other
        ))),
    }
}
