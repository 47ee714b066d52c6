//! Retriever backed by the flat vector index

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::VectorIndex;
use crate::domain::crag::{Document, Retriever};
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::DomainError;

/// Embeds the question with the index's own model and ranks by cosine
#[derive(Debug)]
pub struct VectorRetriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    similarity_threshold: Option<f32>,
}

impl VectorRetriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            index,
            embedder,
            similarity_threshold: None,
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: Option<f32>) -> Self {
        self.similarity_threshold = threshold;
        self
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<Document>, DomainError> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest::single(self.index.embedding_model(), question);
        let query = self
            .embedder
            .embed(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                DomainError::provider(self.embedder.provider_name(), "No embedding returned")
            })?;

        let hits = self.index.search(&query, k, self.similarity_threshold);

        debug!(
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "Vector search complete"
        );

        Ok(hits
            .into_iter()
            .map(|hit| {
                Document::new(hit.entry.content.clone()).with_all_sources(hit.entry.source.clone())
            })
            .collect())
    }
}
