//! LLM Provider Trait
//!
//! Defines the common interface for all LLM providers.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::types::{GenerationRequest, LlmError, LlmResult, ProviderConfig};
use superlearn_core::partial_json::extract_json_object;
use superlearn_core::streaming::ObjectStreamEvent;

/// Trait that all LLM providers must implement.
///
/// Provides a unified interface for:
/// - Free-text completions (generate_text)
/// - Structured object completions (generate_object)
/// - Streamed structured completions (stream_object)
/// - Health checking
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Get the configuration for this provider.
    fn config(&self) -> &ProviderConfig;

    /// Send a prompt and get the complete text response.
    async fn generate_text(&self, request: GenerationRequest) -> LlmResult<String>;

    /// Request a JSON object and parse it.
    ///
    /// The default implementation asks for text and extracts the object from
    /// it, tolerating markdown fences and surrounding prose.
    async fn generate_object(&self, request: GenerationRequest) -> LlmResult<Value> {
        let text = self.generate_text(request).await?;
        parse_object_response(&text)
    }

    /// Stream a JSON object, emitting progressively filled snapshots on `tx`.
    ///
    /// Returns the final object: whatever fields are present when the stream
    /// ends. Cancelling `cancel` aborts the request with `LlmError::Cancelled`.
    async fn stream_object(
        &self,
        request: GenerationRequest,
        tx: mpsc::Sender<ObjectStreamEvent>,
        cancel: CancellationToken,
    ) -> LlmResult<Value>;

    /// Check if the provider is reachable and the credentials are accepted.
    async fn health_check(&self) -> LlmResult<()>;
}

/// Parse a complete model response into a JSON object.
pub fn parse_object_response(text: &str) -> LlmResult<Value> {
    let candidate = extract_json_object(text);
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(LlmError::ParseError {
            message: "Model response is not a JSON object".to_string(),
        }),
        Err(e) => Err(LlmError::ParseError {
            message: format!("Failed to parse model response: {}", e),
        }),
    }
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
