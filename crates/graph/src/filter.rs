//! Corrective relevance filter.

use crate::deadline::within;
use crate::grader::DocumentGrader;
use corag_core::{AppError, AppResult};
use corag_knowledge::Evidence;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;

/// Result of one filtering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Relevant documents, in input order.
    pub retained: Vec<Evidence>,
    /// True iff at least one document was dropped.
    pub needs_more_evidence: bool,
}

/// Grades every document independently and keeps the relevant ones.
///
/// Up to `concurrency` grading calls are in flight at once. Results are
/// reassembled in input order, so any concurrency gives the same outcome as
/// sequential evaluation.
pub struct RelevanceFilter {
    grader: Arc<dyn DocumentGrader>,
    concurrency: usize,
    call_timeout: Option<Duration>,
}

impl RelevanceFilter {
    pub fn new(grader: Arc<dyn DocumentGrader>, concurrency: usize) -> Self {
        Self {
            grader,
            concurrency: concurrency.max(1),
            call_timeout: None,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub async fn filter(&self, question: &str, evidence: Vec<Evidence>) -> AppResult<FilterOutcome> {
        if evidence.is_empty() {
            return Ok(FilterOutcome {
                retained: Vec::new(),
                needs_more_evidence: false,
            });
        }

        let verdicts: Vec<bool> = stream::iter(evidence.iter().map(|doc| {
            within(
                self.call_timeout,
                AppError::Classification,
                "document grading",
                self.grader.is_relevant(question, doc),
            )
        }))
        .buffered(self.concurrency)
        .try_collect()
        .await?;

        let total = evidence.len();
        let retained: Vec<Evidence> = evidence
            .into_iter()
            .zip(verdicts)
            .filter_map(|(doc, relevant)| relevant.then_some(doc))
            .collect();
        let needs_more_evidence = retained.len() < total;

        tracing::info!(
            kept = retained.len(),
            dropped = total - retained.len(),
            "Relevance filter pass complete"
        );

        Ok(FilterOutcome {
            retained,
            needs_more_evidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::KeywordGrader;
    use corag_knowledge::EvidenceSource;

    fn docs(contents: &[&str]) -> Vec<Evidence> {
        contents
            .iter()
            .map(|c| Evidence::new(*c, EvidenceSource::KnowledgeBase))
            .collect()
    }

    fn contents(evidence: &[Evidence]) -> Vec<&str> {
        evidence.iter().map(|e| e.content.as_str()).collect()
    }

    #[tokio::test]
    async fn test_order_preserved_and_flag_set() {
        let filter = RelevanceFilter::new(Arc::new(KeywordGrader::relevant_if("keep")), 4);
        let outcome = filter
            .filter("q", docs(&["A keep", "B drop", "C keep"]))
            .await
            .unwrap();

        assert_eq!(contents(&outcome.retained), vec!["A keep", "C keep"]);
        assert!(outcome.needs_more_evidence);
    }

    #[tokio::test]
    async fn test_all_relevant() {
        let filter = RelevanceFilter::new(Arc::new(KeywordGrader::relevant_if("keep")), 2);
        let outcome = filter.filter("q", docs(&["keep 1", "keep 2"])).await.unwrap();

        assert_eq!(outcome.retained.len(), 2);
        assert!(!outcome.needs_more_evidence);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let grader = Arc::new(KeywordGrader::relevant_if("keep"));
        let filter = RelevanceFilter::new(grader.clone(), 4);
        let outcome = filter.filter("q", Vec::new()).await.unwrap();

        assert!(outcome.retained.is_empty());
        assert!(!outcome.needs_more_evidence);
        assert_eq!(grader.calls(), 0);
    }

    #[tokio::test]
    async fn test_sequential_matches_concurrent() {
        let input = docs(&["keep a", "x", "keep b", "y", "keep c", "z", "keep d"]);
        let sequential = RelevanceFilter::new(Arc::new(KeywordGrader::relevant_if("keep")), 1)
            .filter("q", input.clone())
            .await
            .unwrap();
        let concurrent = RelevanceFilter::new(Arc::new(KeywordGrader::relevant_if("keep")), 8)
            .filter("q", input)
            .await
            .unwrap();

        assert_eq!(sequential, concurrent);
    }

    #[tokio::test]
    async fn test_grader_failure_surfaces() {
        let filter = RelevanceFilter::new(Arc::new(KeywordGrader::failing_on("poison")), 4);
        let result = filter.filter("q", docs(&["fine", "poison", "fine"])).await;
        assert!(matches!(result, Err(AppError::Classification(_))));
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let filter = RelevanceFilter::new(Arc::new(KeywordGrader::relevant_if("keep")), 0);
        assert_eq!(filter.concurrency, 1);
    }
}
