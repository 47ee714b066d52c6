//! CRAG run configuration

use serde::{Deserialize, Serialize};

use super::grader::GraderStrictness;

/// Configuration for one CRAG pipeline instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CragConfig {
    /// Number of documents requested from the retriever
    #[serde(default = "default_retrieve_k")]
    pub retrieve_k: usize,
    /// Number of web search hits appended on fallback
    #[serde(default = "default_search_k")]
    pub search_k: usize,
    /// Grading calls in flight at once (1 = sequential)
    #[serde(default = "default_grading_concurrency")]
    pub grading_concurrency: usize,
    /// Upper bound for every external call, in milliseconds
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Tolerance for text around the grader's JSON object
    #[serde(default)]
    pub grader_strictness: GraderStrictness,
}

fn default_retrieve_k() -> usize {
    4
}

fn default_search_k() -> usize {
    3
}

fn default_grading_concurrency() -> usize {
    1
}

fn default_call_timeout_ms() -> u64 {
    60_000
}

impl Default for CragConfig {
    fn default() -> Self {
        Self {
            retrieve_k: default_retrieve_k(),
            search_k: default_search_k(),
            grading_concurrency: default_grading_concurrency(),
            call_timeout_ms: default_call_timeout_ms(),
            grader_strictness: GraderStrictness::default(),
        }
    }
}

impl CragConfig {
    /// Create a new CRAG configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retrieve_k(mut self, k: usize) -> Self {
        self.retrieve_k = k;
        self
    }

    pub fn with_search_k(mut self, k: usize) -> Self {
        self.search_k = k;
        self
    }

    /// Set grading parallelism; values below 1 are raised to 1
    pub fn with_grading_concurrency(mut self, concurrency: usize) -> Self {
        self.grading_concurrency = concurrency.max(1);
        self
    }

    pub fn with_call_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.call_timeout_ms = timeout_ms;
        self
    }

    pub fn with_grader_strictness(mut self, strictness: GraderStrictness) -> Self {
        self.grader_strictness = strictness;
        self
    }
}
