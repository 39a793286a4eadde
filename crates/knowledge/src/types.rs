//! Evidence type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata key holding the evidence origin.
pub const SOURCE_KEY: &str = "source";

/// Where a piece of evidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Vector index lookup
    KnowledgeBase,
    /// Live web search
    Web,
}

impl EvidenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceSource::KnowledgeBase => "knowledge_base",
            EvidenceSource::Web => "web",
        }
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrieved text passage plus provenance.
///
/// Evidence is never mutated once created. The orchestrator only drops
/// documents (filtering) or swaps in a new batch (web search).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Passage text used as generation context
    pub content: String,

    /// Opaque provenance mapping
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Evidence {
    /// Create evidence with `source` set in its metadata.
    pub fn new(content: impl Into<String>, source: EvidenceSource) -> Self {
        let mut metadata = serde_json::Map::new();
        metadata.insert(SOURCE_KEY.to_string(), source.as_str().into());
        Self {
            content: content.into(),
            metadata: serde_json::Value::Object(metadata),
        }
    }

    /// Merge extra provenance fields into the metadata object.
    ///
    /// Non-object metadata is replaced by an object.
    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        if !self.metadata.is_object() {
            self.metadata = serde_json::json!({});
        }
        if let Some(map) = self.metadata.as_object_mut() {
            map.insert(key.to_string(), value);
        }
        self
    }

    /// The recorded origin, if any.
    pub fn source(&self) -> Option<EvidenceSource> {
        match self.metadata.get(SOURCE_KEY).and_then(|v| v.as_str()) {
            Some("knowledge_base") => Some(EvidenceSource::KnowledgeBase),
            Some("web") => Some(EvidenceSource::Web),
            _ => None,
        }
    }
}

/// Join evidence contents into one context block for a prompt.
pub fn join_contents(evidence: &[Evidence]) -> String {
    evidence
        .iter()
        .map(|e| e.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_source() {
        let e = Evidence::new("Socrates was tried in 399 BC.", EvidenceSource::Web);
        assert_eq!(e.source(), Some(EvidenceSource::Web));
        assert_eq!(e.metadata["source"], "web");
    }

    #[test]
    fn test_with_metadata_merges() {
        let e = Evidence::new("text", EvidenceSource::KnowledgeBase)
            .with_metadata("score", serde_json::json!(0.82));
        assert_eq!(e.source(), Some(EvidenceSource::KnowledgeBase));
        assert_eq!(e.metadata["score"], 0.82);
    }

    #[test]
    fn test_with_metadata_on_non_object() {
        let e = Evidence {
            content: "text".to_string(),
            metadata: serde_json::Value::Null,
        }
        .with_metadata("page", serde_json::json!(3));
        assert_eq!(e.metadata["page"], 3);
        assert_eq!(e.source(), None);
    }

    #[test]
    fn test_join_contents() {
        let evidence = vec![
            Evidence::new("first", EvidenceSource::Web),
            Evidence::new("second", EvidenceSource::Web),
        ];
        assert_eq!(join_contents(&evidence), "first\n\nsecond");
        assert_eq!(join_contents(&[]), "");
    }
}
