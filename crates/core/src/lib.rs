//! SuperLearn Core
//!
//! Foundational types shared by the SuperLearn workspace. This crate has zero
//! dependencies on application-level code (HTTP, database, LLM providers).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `template` - Placeholder extraction and substitution for prompt templates
//! - `streaming` - Structured stream events and the partial-object builder
//! - `partial_json` - Fence stripping and repair of truncated JSON

pub mod error;
pub mod partial_json;
pub mod streaming;
pub mod template;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Template Engine ────────────────────────────────────────────────────
pub use template::{extract_variables, fill_template, has_placeholders, missing_variables};

// ── Structured Streaming ───────────────────────────────────────────────
pub use partial_json::{extract_json_object, repair_partial_json, strip_code_fence};
pub use streaming::{ObjectStreamEvent, PartialObjectBuilder};
