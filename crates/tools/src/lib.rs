//! SuperLearn Tools
//!
//! Tool execution for SuperLearn chat turns:
//! - `ToolResult` - execution result type
//! - `Tool` trait and `ToolRegistry` - registration, lookup, guarded execution
//! - `ToolParameters` - typed arguments, one variant per tool
//! - search backends (Perplexity, Tavily, Brave, mock) and the calculator
//! - `ToolCallTracker` - per-turn lifecycle of tool calls
//! - `ToolDispatcher` - concurrent batch execution of tracked calls

pub mod academic_search;
pub mod calculator;
pub mod definitions;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod params;
pub mod search;
pub mod tracker;
pub mod trait_def;
pub mod web_search;

pub use academic_search::{academic_backend, AcademicSearchTool, MockAcademicBackend};
pub use calculator::{evaluate, CalculatorTool, Evaluation};
pub use definitions::{default_registry, SearchSettings};
pub use dispatch::{BatchOutcome, ToolDispatcher};
pub use error::ToolError;
pub use executor::{ToolMetadata, ToolResult};
pub use params::{
    CalculatorParams, SearchParams, ToolParameters, ACADEMIC_SEARCH, CALCULATOR, WEB_SEARCH,
};
pub use search::{Paper, SearchBackend, SearchHit, SearchResponse, WebResult};
pub use tracker::{ToolCall, ToolCallStatus, ToolCallTracker};
pub use trait_def::{
    cancelled_result, Tool, ToolDefinition, ToolExecutionContext, ToolRegistry, CANCELLED_ERROR,
    DEFAULT_TOOL_TIMEOUT,
};
pub use web_search::{web_backend, MockWebBackend, WebSearchTool};
