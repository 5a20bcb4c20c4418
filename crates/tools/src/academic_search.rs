//! Academic Search
//!
//! Peer-reviewed paper lookup through Perplexity's chat-completions API,
//! falling back to a fixed mock result when no API key is configured.

use async_trait::async_trait;
use chrono::Datelike;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::executor::ToolResult;
use crate::params::{ToolParameters, ACADEMIC_SEARCH};
use crate::search::{sanitize_query, Paper, SearchBackend, SearchHit, SearchResponse};
use crate::trait_def::{Tool, ToolExecutionContext};
use superlearn_core::partial_json::extract_json_object;

const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";

/// Perplexity-backed academic search (requires API key)
pub struct PerplexityBackend {
    client: reqwest::Client,
    api_key: String,
}

impl PerplexityBackend {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

/// Extract papers from the model's answer.
///
/// The answer should be a JSON object with a `papers` array; anything else
/// becomes a single synthetic paper carrying the raw text as its abstract.
pub fn parse_papers(content: &str, query: &str) -> Vec<Paper> {
    let parsed = serde_json::from_str::<Value>(extract_json_object(content));
    match parsed {
        Ok(value) => value
            .get("papers")
            .cloned()
            .and_then(|papers| serde_json::from_value::<Vec<Paper>>(papers).ok())
            .unwrap_or_default(),
        Err(_) => vec![Paper {
            title: query.to_string(),
            authors: vec!["Various".to_string()],
            year: chrono::Utc::now().year(),
            abstract_text: content.to_string(),
            url: "#".to_string(),
            citations: 0,
        }],
    }
}

#[async_trait]
impl SearchBackend for PerplexityBackend {
    fn name(&self) -> &str {
        "Perplexity Academic Search"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<SearchResponse, String> {
        let started = Instant::now();
        let body = json!({
            "model": "sonar",
            "messages": [
                {
                    "role": "system",
                    "content": "You are an academic search assistant. Format your response as JSON with an array of papers."
                },
                {
                    "role": "user",
                    "content": format!(
                        "Find {} peer-reviewed academic papers about: {}. Return as JSON with title, authors, year, abstract, url, and citations.",
                        limit, query
                    )
                }
            ],
            "search_filter": "academic"
        });

        let response = self
            .client
            .post(PERPLEXITY_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Perplexity request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(format!(
                "Perplexity API error ({}): {}",
                status.as_u16(),
                err_body
            ));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Perplexity response: {}", e))?;

        let content = data
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| "Perplexity response contained no content".to_string())?;

        let papers = parse_papers(content, query);
        let total_results = papers.len();

        Ok(SearchResponse {
            results: papers.into_iter().take(limit).map(SearchHit::Paper).collect(),
            duration: started.elapsed().as_millis() as u64,
            sources: Some(vec![self.name().to_string()]),
            total_results,
        })
    }
}

/// Canned academic result used when no API key is configured
pub struct MockAcademicBackend;

#[async_trait]
impl SearchBackend for MockAcademicBackend {
    fn name(&self) -> &str {
        "Mock Database"
    }

    fn is_mock(&self) -> bool {
        true
    }

    async fn search(&self, query: &str, _limit: usize) -> Result<SearchResponse, String> {
        Ok(SearchResponse {
            results: vec![SearchHit::Paper(Paper {
                title: format!("Sample Academic Paper on {}", query),
                authors: vec!["Dr. Smith".to_string(), "Dr. Johnson".to_string()],
                year: 2024,
                abstract_text: "This is a sample abstract for the academic search query..."
                    .to_string(),
                url: "https://example.com/paper1".to_string(),
                citations: 42,
            })],
            duration: 100,
            sources: Some(vec![self.name().to_string()]),
            total_results: 1,
        })
    }
}

/// Pick the backend for the given key: Perplexity when present, mock otherwise
pub fn academic_backend(client: reqwest::Client, api_key: Option<&str>) -> Arc<dyn SearchBackend> {
    match api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => Arc::new(PerplexityBackend::new(client, key)),
        None => {
            tracing::warn!("PERPLEXITY_API_KEY not set, academic search will return mock data");
            Arc::new(MockAcademicBackend)
        }
    }
}

/// The `academic_search` tool
pub struct AcademicSearchTool {
    backend: Arc<dyn SearchBackend>,
}

impl AcademicSearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }
}

#[async_trait]
impl Tool for AcademicSearchTool {
    fn name(&self) -> &str {
        ACADEMIC_SEARCH
    }

    fn description(&self) -> &str {
        "Search for peer-reviewed academic papers and research"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query for academic papers"
                },
                "limit": {
                    "type": "number",
                    "description": "Maximum number of results to return",
                    "default": 5
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, _ctx: &ToolExecutionContext, params: &ToolParameters) -> ToolResult {
        let ToolParameters::AcademicSearch(search) = params else {
            return ToolResult::err(format!("Invalid parameters for {}", ACADEMIC_SEARCH));
        };
        let query = sanitize_query(&search.query);
        if query.is_empty() {
            return ToolResult::err("Query parameter is required");
        }

        match self.backend.search(&query, search.effective_limit()).await {
            Ok(response) => response.into_tool_result(),
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "academic search failed");
                ToolResult::err(e)
            }
        }
    }
}
