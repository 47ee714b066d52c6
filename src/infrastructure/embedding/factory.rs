use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{OllamaEmbeddingProvider, OpenAiEmbeddingProvider};
use crate::domain::{DomainError, EmbeddingProvider};
use crate::infrastructure::llm::{
    resolve_api_key, HttpClient, DEFAULT_OLLAMA_BASE_URL, DEFAULT_OPENAI_BASE_URL,
};

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbeddingProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_base_url")]
        base_url: String,
    },
    #[serde(rename = "openai")]
    OpenAi {
        #[serde(default = "default_openai_base_url")]
        base_url: String,
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

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self::Ollama {
            base_url: default_ollama_base_url(),
        }
    }
}

/// Factory for creating embedding providers
#[derive(Debug)]
pub struct EmbeddingProviderFactory;

impl EmbeddingProviderFactory {
    pub fn create(
        config: &EmbeddingProviderConfig,
        http_client: HttpClient,
    ) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
        match config {
            EmbeddingProviderConfig::Ollama { base_url } => Ok(Arc::new(
                OllamaEmbeddingProvider::with_base_url(http_client, base_url),
            )),

            EmbeddingProviderConfig::OpenAi { base_url, api_key } => {
                let api_key = resolve_api_key(api_key.as_deref(), "OPENAI_API_KEY")?;
                Ok(Arc::new(OpenAiEmbeddingProvider::with_base_url(
                    http_client,
                    api_key,
                    base_url,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_from_config() {
        let config: EmbeddingProviderConfig =
            serde_json::from_str(r#"{"type": "ollama", "base_url": "http://gpu:11434"}"#).unwrap();
        let provider = EmbeddingProviderFactory::create(&config, HttpClient::new()).unwrap();
        assert_eq!(provider.provider_name(), "ollama");

        let config: EmbeddingProviderConfig =
            serde_json::from_str(r#"{"type": "openai", "api_key": "sk-test"}"#).unwrap();
        let provider = EmbeddingProviderFactory::create(&config, HttpClient::new()).unwrap();
        assert_eq!(provider.provider_name(), "openai");
    }
}
