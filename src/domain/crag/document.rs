//! Retrieved or fetched text plus provenance

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the origin URL of a document
pub const SOURCE_URL: &str = "url";

/// A unit of retrieved or fetched text.
///
/// Documents are produced by the retriever or the web search fallback and only
/// ever read by later stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    content: String,
    #[serde(default)]
    source: BTreeMap<String, String>,
}

impl Document {
    /// Create a document with no provenance metadata
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: BTreeMap::new(),
        }
    }

    /// Add a provenance entry
    pub fn with_source(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.source.insert(key.into(), value.into());
        self
    }

    /// Replace all provenance metadata
    pub fn with_all_sources(mut self, source: BTreeMap<String, String>) -> Self {
        self.source = source;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source(&self) -> &BTreeMap<String, String> {
        &self.source
    }

    /// Origin URL, when known
    pub fn url(&self) -> Option<&str> {
        self.source.get(SOURCE_URL).map(String::as_str)
    }
}
