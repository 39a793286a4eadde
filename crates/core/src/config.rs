//! Configuration management for corag.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config files (.corag/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. Pipeline, knowledge and web-search settings live in
//! their own YAML sections; every field is optional in the file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Providers the factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .corag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Default LLM provider (e.g., "ollama")
    pub provider: String,

    /// Default model identifier
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Orchestration settings
    pub pipeline: PipelineConfig,

    /// Knowledge-base retrieval settings
    pub knowledge: KnowledgeConfig,

    /// Web search settings
    pub web_search: WebSearchConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama { endpoint: String, model: String },
}

/// How web-search evidence combines with evidence already in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WebEvidenceMode {
    /// The web batch replaces the current evidence.
    #[default]
    Replace,
    /// The web batch is appended after the retained evidence.
    Append,
}

/// Orchestration settings (`pipeline:` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum feedback re-entries into web search / generation
    #[serde(rename = "maxIterations")]
    pub max_iterations: u32,

    /// Per external call timeout in seconds
    #[serde(rename = "callTimeoutSecs", skip_serializing_if = "Option::is_none")]
    pub call_timeout_secs: Option<u64>,

    /// Concurrent document gradings in the relevance filter (1 = sequential)
    #[serde(rename = "filterConcurrency")]
    pub filter_concurrency: usize,

    #[serde(rename = "webEvidence")]
    pub web_evidence: WebEvidenceMode,

    /// Default for the relevance-filter stage when the caller does not say
    pub correction: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            call_timeout_secs: None,
            filter_concurrency: 4,
            web_evidence: WebEvidenceMode::Replace,
            correction: false,
        }
    }
}

impl PipelineConfig {
    /// Timeout applied to each external call, if configured.
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_secs.map(Duration::from_secs)
    }
}

/// Knowledge-base retrieval settings (`knowledge:` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// LanceDB directory, relative to the workspace unless absolute
    #[serde(rename = "indexPath")]
    pub index_path: PathBuf,

    /// Table holding the ingested chunks
    pub table: String,

    /// Number of documents fetched per question
    #[serde(rename = "topK")]
    pub top_k: usize,

    #[serde(rename = "embeddingModel")]
    pub embedding_model: String,

    #[serde(rename = "embeddingDim")]
    pub embedding_dim: usize,

    /// Embedding service endpoint (defaults to the Ollama endpoint)
    #[serde(rename = "embeddingEndpoint", skip_serializing_if = "Option::is_none")]
    pub embedding_endpoint: Option<String>,

    /// Similarity floor; hits below it are dropped before the run sees them
    #[serde(rename = "minScore", skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from(".corag/index"),
            table: "chunks".to_string(),
            top_k: 4,
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            embedding_endpoint: None,
            min_score: None,
        }
    }
}

/// Web search settings (`webSearch:` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchConfig {
    pub endpoint: String,

    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: String,

    #[serde(rename = "maxResults")]
    pub max_results: usize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.tavily.com/search".to_string(),
            api_key_env: "TAVILY_API_KEY".to_string(),
            max_results: 3,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    pipeline: Option<PartialPipeline>,
    knowledge: Option<PartialKnowledge>,
    #[serde(rename = "webSearch")]
    web_search: Option<PartialWebSearch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PartialPipeline {
    #[serde(rename = "maxIterations")]
    max_iterations: Option<u32>,
    #[serde(rename = "callTimeoutSecs")]
    call_timeout_secs: Option<u64>,
    #[serde(rename = "filterConcurrency")]
    filter_concurrency: Option<usize>,
    #[serde(rename = "webEvidence")]
    web_evidence: Option<WebEvidenceMode>,
    correction: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PartialKnowledge {
    #[serde(rename = "indexPath")]
    index_path: Option<PathBuf>,
    table: Option<String>,
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "embeddingModel")]
    embedding_model: Option<String>,
    #[serde(rename = "embeddingDim")]
    embedding_dim: Option<usize>,
    #[serde(rename = "embeddingEndpoint")]
    embedding_endpoint: Option<String>,
    #[serde(rename = "minScore")]
    min_score: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PartialWebSearch {
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    #[serde(rename = "maxResults")]
    max_results: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            pipeline: PipelineConfig::default(),
            knowledge: KnowledgeConfig::default(),
            web_search: WebSearchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and the environment.
    ///
    /// Environment variables:
    /// - `CORAG_WORKSPACE`: Override workspace path
    /// - `CORAG_CONFIG`: Path to config file
    /// - `CORAG_PROVIDER`: LLM provider
    /// - `CORAG_MODEL`: Model identifier
    /// - `CORAG_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use corag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Max iterations: {}", config.pipeline.max_iterations);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], but an explicit workspace or config file
    /// (e.g. from command-line flags) wins over the environment, so the YAML
    /// that gets merged is the one the caller pointed at.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("CORAG_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("CORAG_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.corag_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("CORAG_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("CORAG_MODEL") {
            config.model = model;
        }

        if let Ok(key) = std::env::var("CORAG_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| match e {
            AppError::Serialization(msg) => {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, msg))
            }
            other => other,
        })
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        if let Some(p) = config_file.pipeline {
            let pipeline = &mut result.pipeline;
            if let Some(v) = p.max_iterations {
                pipeline.max_iterations = v;
            }
            if p.call_timeout_secs.is_some() {
                pipeline.call_timeout_secs = p.call_timeout_secs;
            }
            if let Some(v) = p.filter_concurrency {
                pipeline.filter_concurrency = v;
            }
            if let Some(v) = p.web_evidence {
                pipeline.web_evidence = v;
            }
            if let Some(v) = p.correction {
                pipeline.correction = v;
            }
        }

        if let Some(k) = config_file.knowledge {
            let knowledge = &mut result.knowledge;
            if let Some(v) = k.index_path {
                knowledge.index_path = v;
            }
            if let Some(v) = k.table {
                knowledge.table = v;
            }
            if let Some(v) = k.top_k {
                knowledge.top_k = v;
            }
            if let Some(v) = k.embedding_model {
                knowledge.embedding_model = v;
            }
            if let Some(v) = k.embedding_dim {
                knowledge.embedding_dim = v;
            }
            if k.embedding_endpoint.is_some() {
                knowledge.embedding_endpoint = k.embedding_endpoint;
            }
            if k.min_score.is_some() {
                knowledge.min_score = k.min_score;
            }
        }

        if let Some(w) = config_file.web_search {
            let web = &mut result.web_search;
            if let Some(v) = w.endpoint {
                web.endpoint = v;
            }
            if let Some(v) = w.api_key_env {
                web.api_key_env = v;
            }
            if let Some(v) = w.max_results {
                web.max_results = v;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .corag directory.
    pub fn corag_dir(&self) -> PathBuf {
        self.workspace.join(".corag")
    }

    /// Resolve the LanceDB directory against the workspace.
    pub fn index_path(&self) -> PathBuf {
        if self.knowledge.index_path.is_absolute() {
            self.knowledge.index_path.clone()
        } else {
            self.workspace.join(&self.knowledge.index_path)
        }
    }

    /// Get the active provider configuration.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint configured for a provider, if any.
    pub fn provider_endpoint(&self, provider: &str) -> Option<&str> {
        match self.get_provider_config(provider)? {
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.as_deref(),
        }
    }

    /// Embedding service endpoint: `knowledge.embeddingEndpoint`, else the
    /// configured Ollama endpoint. `None` leaves the embedder on its default.
    pub fn embedding_endpoint(&self) -> Option<&str> {
        self.knowledge
            .embedding_endpoint
            .as_deref()
            .or_else(|| self.provider_endpoint("ollama"))
    }

    /// Resolve the API key for a provider.
    ///
    /// `CORAG_API_KEY` wins; otherwise the provider's `apiKeyEnv` is read.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider)? {
            ProviderConfig::OpenAI { api_key_env, .. } => std::env::var(api_key_env).ok(),
            ProviderConfig::Ollama { .. } => None,
        }
    }

    /// Resolve the web search API key from its environment variable.
    pub fn resolve_web_search_key(&self) -> Option<String> {
        std::env::var(&self.web_search.api_key_env).ok()
    }

    /// Validate configuration for the active provider and pipeline.
    pub fn validate(&self) -> AppResult<()> {
        let provider = &self.provider;

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if let Some(ProviderConfig::OpenAI { api_key_env, .. }) =
            self.get_provider_config(provider)
        {
            if self.api_key.is_none() && std::env::var(api_key_env).is_err() {
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    api_key_env
                )));
            }
        }

        if self.knowledge.top_k == 0 {
            return Err(AppError::Config("knowledge.topK must be at least 1".to_string()));
        }

        if self.pipeline.filter_concurrency == 0 {
            return Err(AppError::Config(
                "pipeline.filterConcurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } => model,
            Self::Ollama { model, .. } => model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.pipeline.max_iterations, 3);
        assert_eq!(config.pipeline.web_evidence, WebEvidenceMode::Replace);
        assert_eq!(config.knowledge.top_k, 4);
        assert!(!config.verbose);
    }

    #[test]
    fn test_corag_dir() {
        let config = AppConfig::default();
        assert!(config.corag_dir().ends_with(".corag"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("openai".to_string()),
            Some("gpt-4o".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "openai");
        assert_eq!(overridden.model, "gpt-4o");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_pipeline_section() {
        let yaml = r#"
pipeline:
  maxIterations: 5
  callTimeoutSecs: 20
  webEvidence: append
knowledge:
  topK: 6
  table: philosophy
webSearch:
  maxResults: 5
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(merged.pipeline.max_iterations, 5);
        assert_eq!(merged.pipeline.call_timeout(), Some(Duration::from_secs(20)));
        assert_eq!(merged.pipeline.web_evidence, WebEvidenceMode::Append);
        // Untouched keys keep their defaults
        assert_eq!(merged.pipeline.filter_concurrency, 4);
        assert_eq!(merged.knowledge.top_k, 6);
        assert_eq!(merged.knowledge.table, "philosophy");
        assert_eq!(merged.knowledge.embedding_model, "nomic-embed-text");
        assert_eq!(merged.web_search.max_results, 5);
    }

    #[test]
    fn test_merge_llm_section_sets_model() {
        let yaml = r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://gpu-box:11434
      model: qwen2.5
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(merged.model, "qwen2.5");
        assert_eq!(merged.provider_endpoint("ollama"), Some("http://gpu-box:11434"));
    }

    #[test]
    fn test_embedding_endpoint_falls_back_to_ollama() {
        assert_eq!(AppConfig::default().embedding_endpoint(), None);

        let yaml = r#"
llm:
  activeProvider: openai
  providers:
    ollama:
      endpoint: http://gpu-box:11434
      model: qwen2.5
"#;
        let mut merged = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(merged.embedding_endpoint(), Some("http://gpu-box:11434"));

        merged.knowledge.embedding_endpoint = Some("http://embedder:11434".to_string());
        assert_eq!(merged.embedding_endpoint(), Some("http://embedder:11434"));
    }

    #[test]
    fn test_merge_yaml_file_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "pipeline: [not, a, map]").unwrap();

        let err = AppConfig::default().merge_yaml(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_load_from_explicit_workspace() {
        let temp = TempDir::new().unwrap();
        let corag = temp.path().join(".corag");
        std::fs::create_dir_all(&corag).unwrap();
        std::fs::write(corag.join("config.yaml"), "pipeline:\n  maxIterations: 7\n").unwrap();

        let config = AppConfig::load_from(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.pipeline.max_iterations, 7);
    }

    #[test]
    fn test_load_from_missing_workspace() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_from(Some(temp.path().join("absent")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_index_path_relative_to_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/corag");
        assert_eq!(config.index_path(), PathBuf::from("/srv/corag/.corag/index"));

        config.knowledge.index_path = PathBuf::from("/data/lance");
        assert_eq!(config.index_path(), PathBuf::from("/data/lance"));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = AppConfig::default();
        config.pipeline.filter_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }
}
