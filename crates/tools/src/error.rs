//! Tool Error Types
//!
//! Errors raised by the tool layer itself (unknown tools, bad parameters,
//! illegal lifecycle transitions). Failures *inside* a tool are never
//! errors; they are `ToolResult::err` values.

use thiserror::Error;

use crate::tracker::ToolCallStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// No tool registered under this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Parameters do not match the tool's schema
    #[error("{message}")]
    InvalidParameters { tool: String, message: String },

    /// A tool call was asked to move to a state it cannot reach
    #[error("Tool call {id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: ToolCallStatus,
        to: ToolCallStatus,
    },

    /// No tool call with this id is tracked
    #[error("Tool call not found: {0}")]
    UnknownCall(String),
}

impl ToolError {
    pub fn invalid_parameters(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
