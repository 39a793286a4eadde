//! Query router: picks the entry data source for a question.

use crate::prompted::{categorize, PromptedCall};
use crate::verdict::{parse_route, Route};
use corag_core::{AppError, AppResult};

/// Decides whether a question goes to the knowledge base or the web.
#[async_trait::async_trait]
pub trait QueryRouter: Send + Sync {
    async fn route(&self, question: &str) -> AppResult<Route>;
}

/// Model-backed router using the `route.question` prompt.
pub struct LlmQueryRouter {
    call: PromptedCall,
}

impl LlmQueryRouter {
    pub fn new(call: PromptedCall) -> Self {
        Self { call }
    }
}

#[async_trait::async_trait]
impl QueryRouter for LlmQueryRouter {
    async fn route(&self, question: &str) -> AppResult<Route> {
        let raw = self
            .call
            .invoke(&[("question", question)])
            .await
            .map_err(|e| categorize(e, AppError::Classification))?;

        let route = parse_route(&raw)?;
        tracing::debug!(prompt = self.call.prompt_id(), %route, "Routing verdict");
        Ok(route)
    }
}
