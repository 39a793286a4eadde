//! One prompt, one model call.
//!
//! Every model-backed collaborator owns a [`PromptedCall`]: a prompt
//! definition bound to a client and model.

use corag_core::{AppError, AppResult};
use corag_llm::{LlmClient, LlmRequest};
use corag_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

pub struct PromptedCall {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl PromptedCall {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
        }
    }

    pub fn prompt_id(&self) -> &str {
        &self.prompt.id
    }

    /// Render the prompt with `vars` and return the raw completion text.
    pub async fn invoke(&self, vars: &[(&str, &str)]) -> AppResult<String> {
        let variables: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let built = build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.prompt.temperature {
            request = request.with_temperature(temperature);
        }
        if self.prompt.output.is_json() {
            request = request.with_json_output();
        }

        let response = self.client.complete(&request).await?;

        tracing::trace!(
            prompt = %self.prompt.id,
            tokens = response.usage.total_tokens,
            "Model call finished"
        );

        Ok(response.content)
    }
}

/// Map a raw provider error into the failure category of the calling stage.
///
/// Errors that already carry a category, or that are not call failures
/// (prompt rendering, configuration), pass through unchanged.
pub fn categorize(err: AppError, category: fn(String) -> AppError) -> AppError {
    match err {
        AppError::Llm(msg) | AppError::Serialization(msg) => category(msg),
        other => other,
    }
}
