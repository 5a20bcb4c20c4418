//! Object Stream Adapter
//!
//! Converts chat-completions SSE lines into `ObjectStreamEvent`s. Text deltas
//! are accumulated and re-parsed after every chunk; whenever the repaired
//! object differs from the previous snapshot a `Partial` event is produced.

use serde::Deserialize;
use serde_json::Value;

use crate::types::{LlmError, LlmResult};
use superlearn_core::partial_json::{extract_json_object, repair_partial_json};
use superlearn_core::streaming::{ObjectStreamEvent, PartialObjectBuilder};

#[derive(Debug, Deserialize)]
struct ChunkEvent {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Stateful adapter for one streamed structured response.
#[derive(Debug, Default)]
pub struct ObjectStreamAdapter {
    text: String,
    builder: PartialObjectBuilder,
    last_snapshot: Option<Value>,
    stop_reason: Option<String>,
    done: bool,
}

impl ObjectStreamAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Text accumulated so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current best-effort object
    pub fn snapshot(&self) -> Value {
        self.builder.snapshot()
    }

    /// Process one SSE line.
    pub fn adapt(&mut self, line: &str) -> LlmResult<Vec<ObjectStreamEvent>> {
        let line = line.trim();
        let Some(data) = line.strip_prefix("data:") else {
            // Comments, `event:` and `id:` lines carry nothing we need
            return Ok(Vec::new());
        };
        let data = data.trim();

        if data == "[DONE]" {
            self.done = true;
            return Ok(Vec::new());
        }

        let chunk: ChunkEvent = serde_json::from_str(data).map_err(|e| LlmError::ParseError {
            message: format!("Invalid stream chunk: {}", e),
        })?;

        let mut events = Vec::new();
        for choice in chunk.choices {
            if let Some(reason) = choice.finish_reason {
                self.stop_reason = Some(reason);
            }
            let Some(content) = choice.delta.and_then(|d| d.content) else {
                continue;
            };
            if content.is_empty() {
                continue;
            }
            self.text.push_str(&content);
            events.push(ObjectStreamEvent::TextDelta { content });

            if let Some(partial) = self.refresh_snapshot() {
                events.push(partial);
            }
        }
        Ok(events)
    }

    fn refresh_snapshot(&mut self) -> Option<ObjectStreamEvent> {
        let repaired = repair_partial_json(&self.text)?;
        if !repaired.is_object() || self.last_snapshot.as_ref() == Some(&repaired) {
            return None;
        }
        self.builder.apply(repaired.clone());
        self.last_snapshot = Some(repaired);
        Some(ObjectStreamEvent::Partial {
            object: self.builder.snapshot(),
        })
    }

    /// Finish the stream and return the final object with the stop reason.
    ///
    /// A complete object in the text wins; otherwise whatever fields were
    /// recovered from the truncated text are returned.
    pub fn finish(self) -> LlmResult<(Value, Option<String>)> {
        if let Ok(value @ Value::Object(_)) =
            serde_json::from_str::<Value>(extract_json_object(&self.text))
        {
            return Ok((value, self.stop_reason));
        }
        if self.builder.is_empty() {
            return Err(LlmError::ParseError {
                message: "Model response did not contain a JSON object".to_string(),
            });
        }
        Ok((self.builder.finalize(), self.stop_reason))
    }
}

/// Splits a byte stream into lines.
///
/// Bytes are held until their line is complete so a multi-byte character
/// split across network chunks is decoded whole.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Trailing bytes of a stream that did not end with a newline
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}
