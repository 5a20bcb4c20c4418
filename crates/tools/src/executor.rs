//! Tool Result Types
//!
//! The value every tool execution resolves to. Failures are data, never
//! `Err`: a tool that cannot do its job returns `ToolResult::err`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fallback message when a failure carries no description
const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Metadata attached to a tool result.
///
/// `duration` (milliseconds) and `sources` are well known; anything else a
/// backend reports (e.g. `totalResults`) lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the execution was successful
    pub success: bool,
    /// Payload (only when successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error message (present exactly when `success` is false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ToolMetadata>,
}

impl ToolResult {
    /// Create a successful result
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: None,
        }
    }

    /// Create an error result. An empty message is replaced so that a failed
    /// result always explains itself.
    pub fn err(error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            error
        };
        Self {
            success: false,
            data: None,
            error: Some(error),
            metadata: None,
        }
    }

    fn metadata_mut(&mut self) -> &mut ToolMetadata {
        self.metadata.get_or_insert_with(ToolMetadata::default)
    }

    /// Record the execution time in milliseconds
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.metadata_mut().duration = Some(duration_ms);
        self
    }

    /// Record where the data came from
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_mut().sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    /// Attach an arbitrary metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata_mut().extra.insert(key.into(), value);
        self
    }

    /// Duration in milliseconds, if recorded
    pub fn duration(&self) -> Option<u64> {
        self.metadata.as_ref().and_then(|m| m.duration)
    }

    /// Whether `success`, `data` and `error` agree with each other
    pub fn is_consistent(&self) -> bool {
        if self.success {
            self.error.is_none()
        } else {
            self.data.is_none() && self.error.as_deref().is_some_and(|e| !e.is_empty())
        }
    }

    /// Convert to text for a chat transcript
    pub fn to_content(&self) -> String {
        if self.success {
            match &self.data {
                Some(Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            }
        } else {
            format!("Error: {}", self.error.as_deref().unwrap_or(UNKNOWN_ERROR))
        }
    }
}
