//! LLM Types
//!
//! Provider configuration, generation requests and the error type shared by
//! every provider.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Supported LLM providers.
///
/// Both speak the chat-completions wire format; Ollama runs locally and does
/// not need an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Ollama,
}

impl ProviderType {
    /// Whether requests must carry an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderType::OpenAI)
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::OpenAI => write!(f, "openai"),
            ProviderType::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for ProviderType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "ollama" => Ok(ProviderType::Ollama),
            other => Err(LlmError::InvalidRequest {
                message: format!("Unknown LLM provider: {}", other),
            }),
        }
    }
}

/// Configuration for an LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The provider type
    pub provider: ProviderType,
    /// API key (not needed for Ollama)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Endpoint override (full chat-completions URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name to use
    pub model: String,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::OpenAI,
            api_key: None,
            base_url: None,
            model: "gpt-4o".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Declared shape for a structured generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectSchema {
    /// Short identifier for the shape (e.g. "curriculum")
    pub name: String,
    /// JSON Schema of the expected object
    pub schema: serde_json::Value,
}

/// A single generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// User prompt
    pub prompt: String,
    /// Optional system prompt
    pub system: Option<String>,
    /// When set, the model is asked for a JSON object of this shape
    pub schema: Option<ObjectSchema>,
    /// Per-request temperature override
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_schema(mut self, name: impl Into<String>, schema: serde_json::Value) -> Self {
        self.schema = Some(ObjectSchema {
            name: name.into(),
            schema,
        });
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Error type for LLM operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LlmError {
    /// Authentication failed (missing or invalid API key)
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Rate limit exceeded
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },

    /// Model not found or not available
    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    /// Invalid request (bad parameters)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Server error from the provider
    #[error("Server error: {message}")]
    ServerError {
        message: String,
        status: Option<u16>,
    },

    /// Network/connection error
    #[error("Network error: {message}")]
    NetworkError { message: String },

    /// Response parsing error
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// The caller cancelled the request
    #[error("generation cancelled")]
    Cancelled,

    /// Other error
    #[error("LLM error: {message}")]
    Other { message: String },
}

impl LlmError {
    /// Whether the failure came from a malformed model response
    pub fn is_parse_error(&self) -> bool {
        matches!(self, LlmError::ParseError { .. })
    }
}

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;
