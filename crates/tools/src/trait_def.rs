//! Tool Trait and Registry
//!
//! Defines the unified `Tool` trait interface and `ToolRegistry` for
//! tool registration, lookup, and guarded execution.
//!
//! Every path through the registry resolves to a `ToolResult`: unknown
//! tools, invalid parameters, timeouts, cancellation and panics inside a
//! tool all become failed results instead of errors.

use async_trait::async_trait;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::executor::ToolResult;
use crate::params::ToolParameters;

/// Default per-call execution budget
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Error text for a call aborted through its cancellation token
pub const CANCELLED_ERROR: &str = "Tool call cancelled";

/// Context provided to each tool during execution.
#[derive(Debug, Clone)]
pub struct ToolExecutionContext {
    /// Cancellation token for cooperative cancellation
    pub cancellation_token: CancellationToken,
    /// Upper bound on a single execution
    pub timeout: Duration,
}

impl ToolExecutionContext {
    pub fn new() -> Self {
        Self {
            cancellation_token: CancellationToken::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}

impl Default for ToolExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified tool interface.
///
/// Implementations perform one external call (or one local computation)
/// per `execute` and convert every failure into `ToolResult::err`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of this tool (e.g., "web_search")
    fn name(&self) -> &str;

    /// Human-readable description of what this tool does
    fn description(&self) -> &str;

    /// JSON schema describing the tool's input parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given context and typed parameters.
    async fn execute(&self, ctx: &ToolExecutionContext, params: &ToolParameters) -> ToolResult;
}

/// Serializable descriptor of a registered tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Registry of available tools.
///
/// Provides O(1) lookup by name and deterministic (registration order)
/// iteration. Built once at startup and shared read-only behind an `Arc`.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Insertion order for deterministic iteration
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. If a tool with the same name already exists, it is replaced.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All tools in registration order.
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).cloned())
            .collect()
    }

    /// Descriptors for every tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list()
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    /// Get all registered tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute the tool selected by the parameters' tag.
    pub async fn execute(&self, ctx: &ToolExecutionContext, params: &ToolParameters) -> ToolResult {
        match self.tools.get(params.tool_name()) {
            Some(tool) => run_guarded(tool.as_ref(), ctx, params).await,
            None => ToolResult::err(format!("Unknown tool: {}", params.tool_name())),
        }
    }

    /// Execute a tool by name with loosely-typed JSON arguments.
    ///
    /// Unknown tools and invalid arguments resolve to failed results.
    pub async fn execute_raw(&self, ctx: &ToolExecutionContext, name: &str, args: Value) -> ToolResult {
        if !self.tools.contains_key(name) {
            return ToolResult::err(format!("Unknown tool: {}", name));
        }
        match ToolParameters::from_call(name, args) {
            Ok(params) => self.execute(ctx, &params).await,
            Err(e) => ToolResult::err(e.to_string()),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one tool under the context's timeout and cancellation token.
async fn run_guarded(
    tool: &dyn Tool,
    ctx: &ToolExecutionContext,
    params: &ToolParameters,
) -> ToolResult {
    if ctx.is_cancelled() {
        return cancelled_result();
    }

    let started = Instant::now();
    let name = tool.name();
    let execution = AssertUnwindSafe(tool.execute(ctx, params)).catch_unwind();

    let result = tokio::select! {
        biased;
        _ = ctx.cancellation_token.cancelled() => cancelled_result(),
        outcome = tokio::time::timeout(ctx.timeout, execution) => match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                tracing::error!(tool = name, "tool panicked during execution");
                ToolResult::err(format!("Tool '{}' failed unexpectedly", name))
            }
            Err(_) => {
                tracing::warn!(tool = name, timeout_secs = ctx.timeout.as_secs(), "tool timed out");
                ToolResult::err(format!(
                    "Tool '{}' timed out after {}s",
                    name,
                    ctx.timeout.as_secs()
                ))
                .with_meta("timedOut", Value::Bool(true))
            }
        },
    };

    if result.duration().is_none() {
        result.with_duration(started.elapsed().as_millis() as u64)
    } else {
        result
    }
}

/// Failed result for a cancelled call, tagged so callers can tell it apart
pub fn cancelled_result() -> ToolResult {
    ToolResult::err(CANCELLED_ERROR).with_meta("cancelled", Value::Bool(true))
}
