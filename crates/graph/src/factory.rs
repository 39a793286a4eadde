//! Composition root: wires configured collaborators into an orchestrator.

use crate::answer_check::LlmAnswerChecker;
use crate::generator::LlmAnswerGenerator;
use crate::grader::LlmDocumentGrader;
use crate::groundedness::LlmGroundednessChecker;
use crate::orchestrator::{Components, Orchestrator, OrchestratorConfig};
use crate::prompted::PromptedCall;
use crate::router::LlmQueryRouter;
use corag_core::{AppConfig, AppError, AppResult};
use corag_knowledge::{LanceDbIndex, OllamaEmbedder, TavilySearcher, VectorRetriever};
use corag_llm::create_client;
use corag_prompt::{
    load_prompt, GENERATE_ANSWER, GRADE_ANSWER, GRADE_DOCUMENT, GRADE_GROUNDEDNESS,
    ROUTE_QUESTION,
};
use std::sync::Arc;

/// Build an orchestrator from configuration.
///
/// Opens the knowledge index, resolves prompts (workspace overrides first)
/// and creates the model client. Missing secrets or a missing index are
/// configuration errors reported before any question is asked.
pub async fn build_orchestrator(config: &AppConfig) -> AppResult<Orchestrator> {
    let components = build_components(config).await?;
    Ok(Orchestrator::new(
        components,
        OrchestratorConfig::from(&config.pipeline),
    ))
}

async fn build_components(config: &AppConfig) -> AppResult<Components> {
    let provider = config.provider.as_str();
    let api_key = config.resolve_api_key(provider);
    let client = create_client(provider, config.provider_endpoint(provider), api_key.as_deref())?;

    tracing::debug!(provider, model = %config.model, "Created model client");

    let call = |id: &str| -> AppResult<PromptedCall> {
        Ok(PromptedCall::new(
            Arc::clone(&client),
            config.model.clone(),
            load_prompt(&config.workspace, id)?,
        ))
    };

    let knowledge = &config.knowledge;
    let embedder = Arc::new(OllamaEmbedder::new(
        config.embedding_endpoint(),
        knowledge.embedding_model.clone(),
        knowledge.embedding_dim,
    ));
    let index = Arc::new(
        LanceDbIndex::open(&config.index_path(), &knowledge.table, knowledge.embedding_dim).await?,
    );
    let retriever = VectorRetriever::new(embedder, index, knowledge.top_k)?
        .with_min_score(knowledge.min_score);

    let web = &config.web_search;
    let web_key = config.resolve_web_search_key().ok_or_else(|| {
        AppError::Config(format!(
            "Web search API key not found in environment variable: {}",
            web.api_key_env
        ))
    })?;
    let web_searcher = TavilySearcher::new(web.endpoint.clone(), web_key, web.max_results);

    Ok(Components {
        router: Arc::new(LlmQueryRouter::new(call(ROUTE_QUESTION)?)),
        retriever: Arc::new(retriever),
        web_searcher: Arc::new(web_searcher),
        grader: Arc::new(LlmDocumentGrader::new(call(GRADE_DOCUMENT)?)),
        generator: Arc::new(LlmAnswerGenerator::new(call(GENERATE_ANSWER)?)),
        groundedness: Arc::new(LlmGroundednessChecker::new(call(GRADE_GROUNDEDNESS)?)),
        answer_checker: Arc::new(LlmAnswerChecker::new(call(GRADE_ANSWER)?)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config_in(workspace: PathBuf) -> AppConfig {
        AppConfig {
            workspace,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_missing_index_is_config_error() {
        let temp = TempDir::new().unwrap();
        let result = build_orchestrator(&config_in(temp.path().to_path_buf())).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_config_error() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(temp.path().to_path_buf());
        config.provider = "carrier-pigeon".to_string();
        let result = build_orchestrator(&config).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
