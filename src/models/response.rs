//! Request and Response Types
//!
//! JSON bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::chat::{MessageRole, ToolCallRequest};
use crate::models::curriculum::GeneratedContent;
use crate::utils::error::{AppError, AppResult};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub database: bool,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            service: "superlearn".to_string(),
            database: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateCurriculumRequest {
    #[serde(default)]
    pub input: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(default)]
    pub curriculum_id: Option<String>,
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub curriculum_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub content: GeneratedContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalculatorRequest {
    #[serde(default)]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorResponse {
    pub result: f64,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderTemplateRequest {
    #[serde(default)]
    pub values: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderTemplateResponse {
    pub text: String,
    /// Placeholders left unfilled
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractVariablesRequest {
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractVariablesResponse {
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddMessageRequest {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolTurnRequest {
    pub calls: Vec<ToolCallRequest>,
    /// Client-chosen id for polling the turn while it runs
    #[serde(default)]
    pub turn_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// Require a non-blank string field
pub fn required_field(value: Option<String>, message: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(message))
}
