//! Tavily web search provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::crag::{WebSearchProvider, WebSearchResult};
use crate::domain::DomainError;
use crate::infrastructure::llm::HttpClientTrait;

pub const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";

/// Depth of the Tavily search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

impl SearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }
}

/// Tavily `/search` API client
#[derive(Debug)]
pub struct TavilySearchProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
    search_depth: SearchDepth,
}

impl<C: HttpClientTrait> TavilySearchProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_TAVILY_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            search_depth: SearchDepth::default(),
        }
    }

    pub fn with_search_depth(mut self, depth: SearchDepth) -> Self {
        self.search_depth = depth;
        self
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn build_request(&self, query: &str, k: usize) -> serde_json::Value {
        serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": k,
            "search_depth": self.search_depth.as_str(),
        })
    }

    fn parse_response(
        &self,
        json: serde_json::Value,
        k: usize,
    ) -> Result<Vec<WebSearchResult>, DomainError> {
        let response: TavilyResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("tavily", format!("Failed to parse response: {}", e))
        })?;

        Ok(response
            .results
            .into_iter()
            .take(k)
            .map(|r| WebSearchResult::new(r.content, r.url))
            .collect())
    }
}

#[async_trait]
impl<C: HttpClientTrait> WebSearchProvider for TavilySearchProvider<C> {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<WebSearchResult>, DomainError> {
        let url = self.search_url();
        let body = self.build_request(query, k);
        let headers = vec![("Content-Type", "application/json")];

        let response = self.client.post_json(&url, headers, &body).await?;
        let results = self.parse_response(response, k)?;

        debug!(results = results.len(), "Tavily search complete");

        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    content: String,
}
