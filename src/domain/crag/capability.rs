//! External capabilities consumed by the CRAG state machine

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use super::document::{Document, SOURCE_URL};
use crate::domain::DomainError;

/// Ranked lookup against a pre-built index
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most `k` documents for the question, best first
    async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<Document>, DomainError>;
}

/// A single live web search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub content: String,
    pub url: String,
}

impl WebSearchResult {
    pub fn new(content: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            url: url.into(),
        }
    }

    /// Wrap the hit as a document whose provenance is its URL
    pub fn into_document(self) -> Document {
        Document::new(self.content).with_source(SOURCE_URL, self.url)
    }
}

/// Live web search
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Search with the query verbatim, returning at most `k` hits
    async fn search(&self, query: &str, k: usize) -> Result<Vec<WebSearchResult>, DomainError>;
}

/// Grounded answer generation
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Answer the question from the supplied documents only
    async fn generate(
        &self,
        question: &str,
        documents: &[Document],
    ) -> Result<String, DomainError>;
}
