//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Request to embed one or more texts with a given model
#[derive(Debug, Clone)]
pub struct EmbeddingRequest {
    model: String,
    inputs: Vec<String>,
}

impl EmbeddingRequest {
    /// Create a request for a single text
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            inputs: vec![text.into()],
        }
    }

    /// Create a request for multiple texts
    pub fn batch(model: impl Into<String>, inputs: Vec<String>) -> Self {
        Self {
            model: model.into(),
            inputs,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }
}

/// Trait for embedding providers (Ollama, OpenAI, etc.)
///
/// Implementations return one vector per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate embeddings for the given inputs
    async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Deterministic bag-of-letters embeddings, so texts sharing words land
    /// close together.
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        name: &'static str,
        error: Option<String>,
    }

    impl MockEmbeddingProvider {
        pub fn new(name: &'static str) -> Self {
            Self { name, error: None }
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn vectorize(text: &str) -> Vec<f32> {
            let mut vector = vec![0.0; 26];
            for c in text.to_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
                vector[(c as u8 - b'a') as usize] += 1.0;
            }
            vector
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<Vec<f32>>, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::provider(self.name, error));
            }

            Ok(request.inputs().iter().map(|t| Self::vectorize(t)).collect())
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_provider_batch_input() {
            let provider = MockEmbeddingProvider::new("test");
            let request = EmbeddingRequest::batch("mock", vec!["Hello".into(), "World".into()]);

            let vectors = provider.embed(request).await.unwrap();

            assert_eq!(vectors.len(), 2);
            assert_eq!(vectors[0].len(), 26);
        }

        #[tokio::test]
        async fn test_mock_provider_error() {
            let provider = MockEmbeddingProvider::new("test").with_error("API error");
            let result = provider.embed(EmbeddingRequest::single("mock", "Hello")).await;

            assert!(result.is_err());
        }
    }
}
