//! Corrective RAG workflow
//!
//! Answers questions over an indexed document corpus. Retrieved documents are
//! graded for relevance by an LLM; when any is rejected the set is topped up
//! with live web search results before the answer is generated.

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use infrastructure::{
    crag::{CragPipeline, LlmAnswerGenerator, LlmRelevanceGrader},
    embedding::EmbeddingProviderFactory,
    ingestion::IngestionPipeline,
    llm::{HttpClient, LlmProviderFactory},
    retrieval::{VectorIndex, VectorRetriever},
    web_search::TavilySearchProvider,
};

/// Build a ready-to-run pipeline: load the index, then construct every
/// capability once so runs can share them.
pub async fn build_pipeline(config: &AppConfig) -> anyhow::Result<CragPipeline> {
    let http_client = create_http_client(config)?;

    let index = VectorIndex::load(&config.index.path).await?;

    if index.embedding_model() != config.embedding.model {
        warn!(
            index_model = index.embedding_model(),
            configured_model = %config.embedding.model,
            "Index was built with a different embedding model; queries use the index model"
        );
    }

    let embedder = EmbeddingProviderFactory::create(&config.embedding.provider, http_client.clone())?;
    let llm = LlmProviderFactory::create(&config.llm.provider, http_client.clone())?;

    let retriever = VectorRetriever::new(Arc::new(index), embedder)
        .with_similarity_threshold(config.index.similarity_threshold);

    let grader = LlmRelevanceGrader::new(llm.clone(), &config.llm.model)
        .with_strictness(config.crag.grader_strictness);

    let generator =
        LlmAnswerGenerator::new(llm, &config.llm.model).with_temperature(config.llm.temperature);

    let web_search = TavilySearchProvider::with_base_url(
        http_client,
        config.web_search.api_key()?,
        &config.web_search.base_url,
    )
    .with_search_depth(config.web_search.search_depth);

    let pipeline = CragPipeline::new(
        Arc::new(retriever),
        Arc::new(grader),
        Arc::new(web_search),
        Arc::new(generator),
    )
    .with_config(config.crag.clone());

    Ok(pipeline)
}

/// Build the pipeline that fetches, chunks and embeds the configured pages
pub fn build_ingestion_pipeline(
    config: &AppConfig,
) -> anyhow::Result<IngestionPipeline<HttpClient>> {
    let http_client = create_http_client(config)?;
    let embedder = EmbeddingProviderFactory::create(&config.embedding.provider, http_client.clone())?;

    Ok(IngestionPipeline::new(
        http_client,
        embedder,
        &config.embedding.model,
    ))
}

fn create_http_client(config: &AppConfig) -> anyhow::Result<HttpClient> {
    Ok(HttpClient::with_timeout(Duration::from_secs(
        config.llm.request_timeout_secs,
    ))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::logging::capture::capture_logs;
    use crate::infrastructure::retrieval::IndexEntry;
    use std::collections::BTreeMap;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_build_pipeline_requires_index() {
        let mut config = AppConfig::default();
        config.index.path = temp_path("missing-index");

        let err = build_pipeline(&config).await.unwrap_err();

        assert!(err.to_string().contains("crag index"));
    }

    #[tokio::test]
    async fn test_build_pipeline_from_saved_index() {
        let path = temp_path("wired-index");
        let mut index = VectorIndex::new("nomic-embed-text:v1.5");
        index
            .insert(IndexEntry {
                id: "a_chunk_0".to_string(),
                content: "Agents plan with LLMs.".to_string(),
                source: BTreeMap::new(),
                embedding: vec![1.0, 0.0],
            })
            .unwrap();
        index.save(&path).await.unwrap();

        let mut config = AppConfig::default();
        config.index.path = path.clone();
        config.web_search.api_key = Some("tvly-test".to_string());
        config.crag = config.crag.with_retrieve_k(2);

        let (logs, _guard) = capture_logs();
        let pipeline = build_pipeline(&config).await.unwrap();
        assert_eq!(pipeline.config().retrieve_k, 2);
        assert_eq!(logs.contents().matches("Loaded vector index").count(), 1);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[test]
    fn test_build_ingestion_pipeline() {
        assert!(build_ingestion_pipeline(&AppConfig::default()).is_ok());
    }
}
