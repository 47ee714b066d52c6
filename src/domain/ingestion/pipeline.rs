//! Ingestion configuration and reporting

use serde::{Deserialize, Serialize};

use super::chunker::ChunkingConfig;

/// Pages indexed when no URL is given explicitly
pub const DEFAULT_URLS: &[&str] = &[
    "https://lilianweng.github.io/posts/2023-06-23-agent/",
    "https://lilianweng.github.io/posts/2023-03-15-prompt-engineering/",
    "https://lilianweng.github.io/posts/2023-10-25-adv-attack-llm/",
];

/// Configuration for building the vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Pages to fetch and index
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,
    #[serde(flatten)]
    pub chunking: ChunkingConfig,
    /// Number of chunks sent per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_urls() -> Vec<String> {
    DEFAULT_URLS.iter().map(|u| u.to_string()).collect()
}

fn default_batch_size() -> usize {
    32
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            chunking: ChunkingConfig::default(),
            batch_size: default_batch_size(),
        }
    }
}

impl IngestionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Outcome of an ingestion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionReport {
    pub pages_fetched: usize,
    pub chunks_indexed: usize,
    /// URLs that could not be fetched, with the reason
    pub failures: Vec<(String, String)>,
}

impl IngestionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
