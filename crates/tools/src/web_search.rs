//! Web Search
//!
//! Pluggable web search with support for Tavily and Brave Search, plus a
//! canned mock backend used whenever no provider key is configured.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::executor::ToolResult;
use crate::params::{ToolParameters, WEB_SEARCH};
use crate::search::{sanitize_query, SearchBackend, SearchHit, SearchResponse, WebResult};
use crate::trait_def::{Tool, ToolExecutionContext};

/// Tavily search provider (requires API key)
pub struct TavilyBackend {
    client: reqwest::Client,
    api_key: String,
}

impl TavilyBackend {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SearchBackend for TavilyBackend {
    fn name(&self) -> &str {
        "Tavily"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<SearchResponse, String> {
        let started = Instant::now();
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": limit,
            "include_answer": false,
        });

        let response = self
            .client
            .post("https://api.tavily.com/search")
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Tavily request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(format!("Tavily API error ({}): {}", status.as_u16(), err_body));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Tavily response: {}", e))?;

        let results = parse_results(data.get("results"), "content", self.name());
        Ok(finish_response(results, limit, started, self.name()))
    }
}

/// Brave Search provider (requires API key)
pub struct BraveBackend {
    client: reqwest::Client,
    api_key: String,
}

impl BraveBackend {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SearchBackend for BraveBackend {
    fn name(&self) -> &str {
        "Brave Search"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<SearchResponse, String> {
        let started = Instant::now();
        let response = self
            .client
            .get("https://api.search.brave.com/res/v1/web/search")
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", &limit.to_string())])
            .send()
            .await
            .map_err(|e| format!("Brave Search request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(format!(
                "Brave Search API error ({}): {}",
                status.as_u16(),
                err_body
            ));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Brave Search response: {}", e))?;

        let results = parse_results(data.pointer("/web/results"), "description", self.name());
        Ok(finish_response(results, limit, started, self.name()))
    }
}

/// Map a provider's result array into `WebResult`s
fn parse_results(items: Option<&Value>, snippet_field: &str, source: &str) -> Vec<WebResult> {
    let field = |item: &Value, key: &str| {
        item.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };
    items
        .and_then(|r| r.as_array())
        .map(|arr| {
            arr.iter()
                .map(|item| WebResult {
                    title: field(item, "title"),
                    snippet: field(item, snippet_field),
                    url: field(item, "url"),
                    source: source.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn finish_response(
    results: Vec<WebResult>,
    limit: usize,
    started: Instant,
    source: &str,
) -> SearchResponse {
    let total_results = results.len();
    SearchResponse {
        results: results.into_iter().take(limit).map(SearchHit::Web).collect(),
        duration: started.elapsed().as_millis() as u64,
        sources: Some(vec![source.to_string()]),
        total_results,
    }
}

/// Canned web results used when no provider is configured
pub struct MockWebBackend;

#[async_trait]
impl SearchBackend for MockWebBackend {
    fn name(&self) -> &str {
        "Mock"
    }

    fn is_mock(&self) -> bool {
        true
    }

    async fn search(&self, query: &str, limit: usize) -> Result<SearchResponse, String> {
        let mock_results = vec![
            WebResult {
                title: format!("Understanding {}", query),
                snippet: format!(
                    "A comprehensive guide to {}. Learn the fundamentals and advanced concepts...",
                    query
                ),
                url: "https://example.com/guide".to_string(),
                source: "Example Guide".to_string(),
            },
            WebResult {
                title: format!("{} - Wikipedia", query),
                snippet: format!(
                    "{} is a topic that encompasses various aspects of modern technology and science...",
                    query
                ),
                url: "https://en.wikipedia.org/wiki/Example".to_string(),
                source: "Wikipedia".to_string(),
            },
            WebResult {
                title: format!("Latest developments in {}", query),
                snippet: format!(
                    "Recent research and news about {}. Discover what experts are saying...",
                    query
                ),
                url: "https://example.com/news".to_string(),
                source: "Tech News".to_string(),
            },
        ];
        let total_results = mock_results.len();

        Ok(SearchResponse {
            results: mock_results
                .into_iter()
                .take(limit)
                .map(SearchHit::Web)
                .collect(),
            duration: 250,
            sources: None,
            total_results,
        })
    }
}

/// Pick the web backend for a provider name, falling back to mock data when
/// the provider is unknown, set to "mock", or missing its key.
pub fn web_backend(
    client: reqwest::Client,
    provider: &str,
    api_key: Option<&str>,
) -> Arc<dyn SearchBackend> {
    let key = api_key.filter(|k| !k.trim().is_empty());
    match (provider.to_lowercase().as_str(), key) {
        ("tavily", Some(key)) => Arc::new(TavilyBackend::new(client, key)),
        ("brave", Some(key)) => Arc::new(BraveBackend::new(client, key)),
        ("mock", _) => Arc::new(MockWebBackend),
        (other, _) => {
            tracing::warn!(
                provider = other,
                "web search provider not usable (missing key?), returning mock data"
            );
            Arc::new(MockWebBackend)
        }
    }
}

/// The `web_search` tool
pub struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
}

impl WebSearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH
    }

    fn description(&self) -> &str {
        "Search the web for current information"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "limit": {
                    "type": "number",
                    "description": "Maximum number of results",
                    "default": 5
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, _ctx: &ToolExecutionContext, params: &ToolParameters) -> ToolResult {
        let ToolParameters::WebSearch(search) = params else {
            return ToolResult::err(format!("Invalid parameters for {}", WEB_SEARCH));
        };
        let query = sanitize_query(&search.query);
        if query.is_empty() {
            return ToolResult::err("Query parameter is required");
        }

        match self.backend.search(&query, search.effective_limit()).await {
            Ok(response) => response.into_tool_result(),
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "web search failed");
                ToolResult::err(e)
            }
        }
    }
}
