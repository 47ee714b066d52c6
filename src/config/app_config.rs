use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{CragConfig, DomainError, IngestionConfig};
use crate::infrastructure::embedding::EmbeddingProviderConfig;
use crate::infrastructure::llm::{resolve_api_key, LlmProviderConfig};
use crate::infrastructure::web_search::{SearchDepth, DEFAULT_TAVILY_BASE_URL};

const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub web_search: WebSearchSettings,
    pub crag: CragConfig,
    pub ingestion: IngestionConfig,
    pub logging: LoggingConfig,
}

/// Chat model used for grading and generation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProviderConfig,
    pub model: String,
    pub temperature: f32,
    /// HTTP client timeout, independent of the per-call pipeline bound
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProviderConfig,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub path: PathBuf,
    pub similarity_threshold: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSearchSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub search_depth: SearchDepth,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProviderConfig::default(),
            model: "llama3:8b".to_string(),
            temperature: 0.0,
            request_timeout_secs: 120,
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderConfig::default(),
            model: "nomic-embed-text:v1.5".to_string(),
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("vectorstore.json"),
            similarity_threshold: None,
        }
    }
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TAVILY_BASE_URL.to_string(),
            api_key: None,
            search_depth: SearchDepth::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl WebSearchSettings {
    /// Configured key, else `TAVILY_API_KEY`
    pub fn api_key(&self) -> Result<String, DomainError> {
        resolve_api_key(self.api_key.as_deref(), TAVILY_API_KEY_ENV)
    }
}

impl AppConfig {
    /// Load `config/default`, `config/local` and `CRAG__*` environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(None)
    }

    /// Like [`AppConfig::load`], with an extra required file layered on top
    /// of the defaults
    pub fn load_with(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("CRAG")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ingestion.urls")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
