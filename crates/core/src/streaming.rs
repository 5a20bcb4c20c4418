//! Structured Stream Types
//!
//! Provider-agnostic events emitted while a structured (JSON object) generation
//! is streaming, and the builder that accumulates them into a snapshot that can
//! be read at any time and finalized when the stream ends.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreResult;

/// Event emitted by a provider while streaming a structured object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectStreamEvent {
    /// Raw text delta from the model
    TextDelta { content: String },

    /// Best-effort snapshot of the object received so far.
    /// Fields may be missing or still growing.
    Partial { object: Value },

    /// Error during streaming
    Error { message: String },

    /// Stream complete
    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
}

/// Accumulates field-by-field updates of a streamed object.
///
/// Object updates are merged recursively; any other value replaces what was
/// there. Arrays are replaced wholesale since a later snapshot of a streamed
/// array always contains the earlier elements.
#[derive(Debug, Clone)]
pub struct PartialObjectBuilder {
    current: Map<String, Value>,
    updates: usize,
}

impl PartialObjectBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            current: Map::new(),
            updates: 0,
        }
    }

    /// Merge an update into the current state.
    ///
    /// Non-object updates are ignored: the root of a structured result is
    /// always an object.
    pub fn apply(&mut self, update: Value) {
        if let Value::Object(fields) = update {
            merge_into(&mut self.current, fields);
            self.updates += 1;
        }
    }

    /// Set a single top-level field
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.current.insert(name.into(), value);
        self.updates += 1;
    }

    /// Number of updates applied so far
    pub fn update_count(&self) -> usize {
        self.updates
    }

    /// Whether no field has arrived yet
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Read the current state without consuming the builder
    pub fn snapshot(&self) -> Value {
        Value::Object(self.current.clone())
    }

    /// Deserialize the current state into `T`.
    ///
    /// `T` should tolerate missing fields (`#[serde(default)]`).
    pub fn snapshot_as<T: DeserializeOwned>(&self) -> CoreResult<T> {
        Ok(serde_json::from_value(self.snapshot())?)
    }

    /// Consume the builder, returning whatever fields are present
    pub fn finalize(self) -> Value {
        Value::Object(self.current)
    }
}

impl Default for PartialObjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_into(target: &mut Map<String, Value>, update: Map<String, Value>) {
    for (key, value) in update {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}
