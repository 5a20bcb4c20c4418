//! Search Backends
//!
//! Shared result types and the pluggable backend trait behind both search
//! tools. Backends report failures as `Err(String)`; the tools turn them into
//! failed `ToolResult`s.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::executor::ToolResult;

/// A web page hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub source: String,
}

/// An academic paper hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: i32,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub citations: u64,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchHit {
    Web(WebResult),
    Paper(Paper),
}

/// Response of a search backend, mirroring the search HTTP endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    /// Milliseconds spent in the backend
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    /// Number of hits before truncation to the requested limit
    pub total_results: usize,
}

impl SearchResponse {
    /// Convert into a successful tool result: `data` is the hit list and the
    /// timing, sources and total count travel in metadata.
    pub fn into_tool_result(self) -> ToolResult {
        let total = self.total_results;
        let data = serde_json::to_value(&self.results).unwrap_or_default();
        let mut result = ToolResult::ok(data)
            .with_duration(self.duration)
            .with_meta("totalResults", serde_json::json!(total));
        if let Some(sources) = self.sources {
            result = result.with_sources(sources);
        }
        result
    }
}

/// Trait for pluggable search providers
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Provider name for display
    fn name(&self) -> &str;

    /// Whether this backend returns canned data instead of calling a service
    fn is_mock(&self) -> bool {
        false
    }

    /// Execute a search query, returning at most `limit` hits
    async fn search(&self, query: &str, limit: usize) -> Result<SearchResponse, String>;
}

/// Strip control characters from a query before sending it anywhere
pub fn sanitize_query(query: &str) -> String {
    query
        .chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}
