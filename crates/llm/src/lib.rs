//! SuperLearn LLM
//!
//! Provides a unified interface for structured and free-text generation:
//! - OpenAI chat completions (also used for local Ollama)
//! - Streamed JSON objects with progressive snapshots
//!
//! Also includes the HTTP client factory.

pub mod http_client;
pub mod object_stream;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use object_stream::{LineBuffer, ObjectStreamAdapter};
pub use openai::OpenAIProvider;
pub use provider::{parse_object_response, LlmProvider};
pub use types::*;
