//! Ollama embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use super::HttpClientTrait;
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::DomainError;
use crate::infrastructure::llm::DEFAULT_OLLAMA_BASE_URL;

/// Ollama embedding provider (`/api/embed`)
#[derive(Debug)]
pub struct OllamaEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> OllamaEmbeddingProvider<C> {
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, DEFAULT_OLLAMA_BASE_URL)
    }

    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }

    fn build_request(&self, request: &EmbeddingRequest) -> serde_json::Value {
        // Oversized inputs are cut to the model context instead of failing
        serde_json::json!({
            "model": request.model(),
            "input": request.inputs(),
            "truncate": true,
        })
    }

    fn parse_response(
        &self,
        json: serde_json::Value,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        let response: OllamaEmbedResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("ollama", format!("Failed to parse embedding response: {}", e))
        })?;

        if response.embeddings.len() != expected {
            return Err(DomainError::provider(
                "ollama",
                format!(
                    "Expected {} embeddings, got {}",
                    expected,
                    response.embeddings.len()
                ),
            ));
        }

        Ok(response.embeddings)
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for OllamaEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<Vec<f32>>, DomainError> {
        if request.inputs().is_empty() {
            return Ok(Vec::new());
        }

        let url = self.embed_url();
        let body = self.build_request(&request);
        let headers = vec![("Content-Type", "application/json")];

        let response = self.client.post_json(&url, headers, &body).await?;

        self.parse_response(response, request.inputs().len())
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::MockHttpClient;

    const TEST_URL: &str = "http://127.0.0.1:11434/api/embed";

    #[tokio::test]
    async fn test_embed_batch() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            serde_json::json!({
                "model": "nomic-embed-text:v1.5",
                "embeddings": [[0.1, 0.2], [0.3, 0.4]]
            }),
        );
        let provider = OllamaEmbeddingProvider::new(client);

        let request =
            EmbeddingRequest::batch("nomic-embed-text:v1.5", vec!["a".into(), "b".into()]);
        let vectors = provider.embed(request).await.unwrap();

        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn test_request_body() {
        let client = MockHttpClient::new()
            .with_response(TEST_URL, serde_json::json!({"embeddings": [[1.0]]}));
        let provider = OllamaEmbeddingProvider::new(client);

        provider
            .embed(EmbeddingRequest::single("nomic-embed-text:v1.5", "agents"))
            .await
            .unwrap();

        let bodies = provider.client.sent_bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].1["model"], "nomic-embed-text:v1.5");
        assert_eq!(bodies[0].1["input"][0], "agents");
        assert_eq!(bodies[0].1["truncate"], true);
    }

    #[tokio::test]
    async fn test_empty_request_skips_http() {
        let provider = OllamaEmbeddingProvider::new(MockHttpClient::new());

        let vectors = provider
            .embed(EmbeddingRequest::batch("m", Vec::new()))
            .await
            .unwrap();

        assert!(vectors.is_empty());
        assert!(provider.client.sent_bodies().is_empty());
    }

    #[tokio::test]
    async fn test_count_mismatch() {
        let client = MockHttpClient::new()
            .with_response(TEST_URL, serde_json::json!({"embeddings": [[1.0]]}));
        let provider = OllamaEmbeddingProvider::new(client);

        let request = EmbeddingRequest::batch("m", vec!["a".into(), "b".into()]);
        assert!(provider.embed(request).await.is_err());
    }

    #[tokio::test]
    async fn test_server_down() {
        let client = MockHttpClient::new().with_error(TEST_URL, "connection refused");
        let provider = OllamaEmbeddingProvider::new(client);

        let err = provider
            .embed(EmbeddingRequest::single("m", "x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
