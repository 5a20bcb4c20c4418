//! OpenAI Provider
//!
//! Implementation of the LlmProvider trait for the chat-completions API.
//! Also serves Ollama, which exposes the same wire format locally.

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::object_stream::{LineBuffer, ObjectStreamAdapter};
use super::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use super::types::{GenerationRequest, LlmError, LlmResult, ProviderConfig, ProviderType};
use crate::http_client::build_http_client;
use superlearn_core::streaming::ObjectStreamEvent;

/// Default OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default local Ollama endpoint (OpenAI-compatible)
const OLLAMA_API_URL: &str = "http://localhost:11434/v1/chat/completions";

/// OpenAI provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Get the API endpoint
    fn endpoint(&self) -> &str {
        match (&self.config.base_url, self.config.provider) {
            (Some(url), _) => url,
            (None, ProviderType::OpenAI) => OPENAI_API_URL,
            (None, ProviderType::Ollama) => OLLAMA_API_URL,
        }
    }

    /// Check if model supports reasoning (o1/o3 models)
    fn model_supports_reasoning(&self) -> bool {
        let model = self.config.model.to_lowercase();
        model.starts_with("o1") || model.starts_with("o3")
    }

    /// Resolve the bearer token, if the provider needs one
    fn api_key(&self) -> LlmResult<Option<&str>> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(Some(key)),
            _ if self.config.provider.requires_api_key() => {
                Err(missing_api_key_error(self.name()))
            }
            _ => Ok(None),
        }
    }

    /// Build the request body for the API
    fn build_request_body(&self, request: &GenerationRequest, stream: bool) -> Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "stream": stream,
        });

        // Temperature is rejected by o1/o3 models
        if !self.model_supports_reasoning() {
            body["temperature"] =
                serde_json::json!(request.temperature.unwrap_or(self.config.temperature));
        }

        let mut messages: Vec<Value> = Vec::new();
        let system = match (&request.system, &request.schema) {
            (Some(sys), Some(schema)) => Some(format!(
                "{}\n\n{}",
                sys,
                schema_instruction(&schema.name, &schema.schema)
            )),
            (None, Some(schema)) => Some(schema_instruction(&schema.name, &schema.schema)),
            (Some(sys), None) => Some(sys.clone()),
            (None, None) => None,
        };
        if let Some(sys) = system {
            messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }
        messages.push(serde_json::json!({
            "role": "user",
            "content": request.prompt
        }));
        body["messages"] = serde_json::json!(messages);

        if request.schema.is_some() {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        body
    }

    async fn post(&self, body: &Value) -> LlmResult<reqwest::Response> {
        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = self.api_key()? {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body_text = response.text().await.unwrap_or_default();
            return Err(parse_http_error(status, &body_text, self.name()));
        }
        Ok(response)
    }
}

/// Feed one SSE line to the adapter and forward its events
async fn adapt_line(
    adapter: &mut ObjectStreamAdapter,
    line: &str,
    tx: &mpsc::Sender<ObjectStreamEvent>,
) {
    if line.trim().is_empty() || adapter.is_done() {
        return;
    }
    match adapter.adapt(line) {
        Ok(events) => {
            for event in events {
                // Receiver may have gone away; keep draining so the
                // final object is still returned.
                let _ = tx.send(event).await;
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed stream chunk");
            let _ = tx
                .send(ObjectStreamEvent::Error {
                    message: e.to_string(),
                })
                .await;
        }
    }
}

/// System instruction describing the JSON object the model must produce
fn schema_instruction(name: &str, schema: &Value) -> String {
    format!(
        "Respond with a single JSON object ({}) that conforms to this JSON Schema. \
         Do not include any text outside the JSON object.\n{}",
        name, schema
    )
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        match self.config.provider {
            ProviderType::OpenAI => "openai",
            ProviderType::Ollama => "ollama",
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate_text(&self, request: GenerationRequest) -> LlmResult<String> {
        let body = self.build_request_body(&request, false);
        let response = self.post(&body).await?;

        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;
        let parsed: ChatResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| LlmError::ParseError {
                message: "Response contained no message content".to_string(),
            })
    }

    async fn stream_object(
        &self,
        request: GenerationRequest,
        tx: mpsc::Sender<ObjectStreamEvent>,
        cancel: CancellationToken,
    ) -> LlmResult<Value> {
        let body = self.build_request_body(&request, true);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            response = self.post(&body) => response?,
        };

        let mut adapter = ObjectStreamAdapter::new();
        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::new();

        while !adapter.is_done() {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(provider = self.name(), "object stream cancelled");
                    return Err(LlmError::Cancelled);
                }
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else { break };
            let chunk = chunk.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

            for line in lines.push(&chunk) {
                adapt_line(&mut adapter, &line, &tx).await;
                if adapter.is_done() {
                    break;
                }
            }
        }
        if let Some(tail) = lines.finish() {
            adapt_line(&mut adapter, &tail, &tx).await;
        }

        let (value, stop_reason) = adapter.finish()?;
        let _ = tx.send(ObjectStreamEvent::Complete { stop_reason }).await;
        Ok(value)
    }

    async fn health_check(&self) -> LlmResult<()> {
        let request = GenerationRequest::new("ping");
        let mut body = self.build_request_body(&request, false);
        body["max_tokens"] = serde_json::json!(1);
        self.post(&body).await.map(|_| ())
    }
}

/// Chat-completions response format
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
