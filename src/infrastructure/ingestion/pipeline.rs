//! Ingestion pipeline: fetch pages, chunk, embed, write the vector index

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{HtmlExtractor, ParsedPage, RecursiveChunker};
use crate::domain::crag::SOURCE_URL;
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::ingestion::{ChunkingStrategy, IngestionConfig, IngestionReport};
use crate::domain::DomainError;
use crate::infrastructure::llm::HttpClientTrait;
use crate::infrastructure::retrieval::{IndexEntry, VectorIndex};

pub const SOURCE_TITLE: &str = "title";
pub const SOURCE_CHUNK_INDEX: &str = "chunk_index";

/// A chunk awaiting its embedding
#[derive(Debug)]
struct PendingChunk {
    id: String,
    content: String,
    source: BTreeMap<String, String>,
}

/// Builds a [`VectorIndex`] from web pages
#[derive(Debug)]
pub struct IngestionPipeline<C: HttpClientTrait> {
    client: C,
    embedder: Arc<dyn EmbeddingProvider>,
    embedding_model: String,
    extractor: HtmlExtractor,
    chunker: Arc<dyn ChunkingStrategy>,
}

impl<C: HttpClientTrait> IngestionPipeline<C> {
    /// Create a new ingestion pipeline using the recursive chunker
    pub fn new(
        client: C,
        embedder: Arc<dyn EmbeddingProvider>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            embedder,
            embedding_model: embedding_model.into(),
            extractor: HtmlExtractor::new(),
            chunker: Arc::new(RecursiveChunker::new()),
        }
    }

    pub fn with_chunker(mut self, chunker: Arc<dyn ChunkingStrategy>) -> Self {
        self.chunker = chunker;
        self
    }

    /// Build the index and write it to `output`
    pub async fn run(
        &self,
        config: &IngestionConfig,
        output: impl AsRef<Path>,
    ) -> Result<IngestionReport, DomainError> {
        let (index, report) = self.build_index(config).await?;
        index.save(output).await?;
        Ok(report)
    }

    /// Fetch, chunk and embed every configured URL.
    ///
    /// Unreachable pages are reported and skipped; embedding failures abort.
    pub async fn build_index(
        &self,
        config: &IngestionConfig,
    ) -> Result<(VectorIndex, IngestionReport), DomainError> {
        config.chunking.validate()?;

        let mut report = IngestionReport::default();
        let mut pending = Vec::new();

        for url in &config.urls {
            match self.client.get_text(url).await {
                Ok(html) => {
                    let page = self.extractor.extract(url.as_str(), &html);
                    let chunks = self.chunk_page(&page, config)?;

                    info!(url = %url, chunks = chunks.len(), "Fetched page");

                    report.pages_fetched += 1;
                    pending.extend(chunks);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to fetch page, skipping");
                    report.failures.push((url.clone(), e.to_string()));
                }
            }
        }

        if pending.is_empty() {
            return Err(DomainError::validation(
                "No content could be indexed from the configured URLs",
            ));
        }

        let mut index = VectorIndex::new(&self.embedding_model);

        for batch in pending.chunks(config.batch_size.max(1)) {
            let inputs: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let request = EmbeddingRequest::batch(&self.embedding_model, inputs);
            let vectors = self.embedder.embed(request).await?;

            if vectors.len() != batch.len() {
                return Err(DomainError::provider(
                    self.embedder.provider_name(),
                    format!(
                        "Expected {} embeddings, got {}",
                        batch.len(),
                        vectors.len()
                    ),
                ));
            }

            for (chunk, embedding) in batch.iter().zip(vectors) {
                index.insert(IndexEntry {
                    id: chunk.id.clone(),
                    content: chunk.content.clone(),
                    source: chunk.source.clone(),
                    embedding,
                })?;
            }

            debug!(embedded = index.len(), total = pending.len(), "Embedded batch");
        }

        report.chunks_indexed = index.len();

        info!(
            pages = report.pages_fetched,
            chunks = report.chunks_indexed,
            failures = report.failures.len(),
            "Ingestion complete"
        );

        Ok((index, report))
    }

    fn chunk_page(
        &self,
        page: &ParsedPage,
        config: &IngestionConfig,
    ) -> Result<Vec<PendingChunk>, DomainError> {
        let chunks = self.chunker.chunk(&page.text, &config.chunking)?;

        Ok(chunks
            .into_iter()
            .map(|chunk| {
                let mut source = BTreeMap::new();
                source.insert(SOURCE_URL.to_string(), page.url.clone());
                source.insert(SOURCE_CHUNK_INDEX.to_string(), chunk.index.to_string());
                if let Some(ref title) = page.title {
                    source.insert(SOURCE_TITLE.to_string(), title.clone());
                }

                PendingChunk {
                    id: format!("{}_chunk_{}", page.url, chunk.index),
                    content: chunk.content,
                    source,
                }
            })
            .collect())
    }
}
