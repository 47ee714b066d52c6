use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::http_client::HttpClient;
use super::ollama::DEFAULT_OLLAMA_BASE_URL;
use super::openai::DEFAULT_OPENAI_BASE_URL;
use super::{OllamaProvider, OpenAiProvider};
use crate::domain::{DomainError, LlmProvider};

const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_base_url")]
        base_url: String,
    },
    #[serde(rename = "openai")]
    OpenAi {
        #[serde(default = "default_openai_base_url")]
        base_url: String,
        /// Falls back to `OPENAI_API_KEY` when unset
        #[serde(default)]
        api_key: Option<String>,
    },
}

fn default_ollama_base_url() -> String {
    DEFAULT_OLLAMA_BASE_URL.to_string()
}

fn default_openai_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self::Ollama {
            base_url: default_ollama_base_url(),
        }
    }
}

/// Resolve an API key from config, then from the environment
pub(crate) fn resolve_api_key(
    configured: Option<&str>,
    env_var: &str,
) -> Result<String, DomainError> {
    configured
        .map(str::to_string)
        .filter(|key| !key.is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|key| !key.is_empty()))
        .ok_or_else(|| {
            DomainError::configuration(format!(
                "No API key configured; set it in the config file or via {}",
                env_var
            ))
        })
}

/// Factory for creating LLM providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create an LLM provider from configuration
    pub fn create(
        config: &LlmProviderConfig,
        http_client: HttpClient,
    ) -> Result<Arc<dyn LlmProvider>, DomainError> {
        match config {
            LlmProviderConfig::Ollama { base_url } => Ok(Arc::new(OllamaProvider::with_base_url(
                http_client,
                base_url,
            ))),

            LlmProviderConfig::OpenAi { base_url, api_key } => {
                let api_key = resolve_api_key(api_key.as_deref(), OPENAI_API_KEY_ENV)?;
                Ok(Arc::new(OpenAiProvider::with_base_url(
                    http_client,
                    api_key,
                    base_url,
                )))
            }
        }
    }
}
