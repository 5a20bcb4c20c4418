//! Batch Dispatch
//!
//! Drives the pending calls of a `ToolCallTracker` through the registry.
//! All calls of a batch run concurrently and the batch resolves only when
//! every call has reached a terminal state; results are keyed by call id.

use futures_util::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::ToolError;
use crate::executor::ToolResult;
use crate::tracker::{ToolCall, ToolCallTracker};
use crate::trait_def::{cancelled_result, ToolExecutionContext, ToolRegistry, DEFAULT_TOOL_TIMEOUT};

/// Outcome of one batch
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Final result per call id
    pub results: HashMap<String, ToolResult>,
    /// Calls that could not be driven (e.g. already started elsewhere)
    pub errors: Vec<ToolError>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    fn context(&self, cancel: &CancellationToken) -> ToolExecutionContext {
        ToolExecutionContext::new()
            .with_timeout(self.timeout)
            .with_cancellation(cancel.clone())
    }

    /// Execute one untracked call by name
    pub async fn execute(&self, name: &str, args: Value, cancel: &CancellationToken) -> ToolResult {
        self.registry.execute_raw(&self.context(cancel), name, args).await
    }

    /// Run one tracked call from `pending` to a terminal state.
    ///
    /// Invalid parameters still pass through `running` so the call never
    /// skips a state.
    pub async fn run_call(
        &self,
        tracker: &ToolCallTracker,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ToolCall, ToolError> {
        let call = tracker.start(id).await?;
        tracing::info!(turn = tracker.turn_id(), call_id = id, tool = %call.tool, "tool call started");

        let result = if cancel.is_cancelled() {
            cancelled_result()
        } else {
            match call.typed_parameters() {
                Ok(params) => self.registry.execute(&self.context(cancel), &params).await,
                Err(e) => ToolResult::err(e.to_string()),
            }
        };

        let finished = tracker.finish(id, result).await?;
        tracing::info!(
            turn = tracker.turn_id(),
            call_id = id,
            status = %finished.status,
            duration_ms = ?finished.result.as_ref().and_then(ToolResult::duration),
            "tool call finished"
        );
        Ok(finished)
    }

    /// Run every pending call of the tracker concurrently and wait for all.
    pub async fn run_batch(
        &self,
        tracker: &ToolCallTracker,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let ids = tracker.pending_ids().await;
        let outcomes = join_all(ids.iter().map(|id| self.run_call(tracker, id, cancel))).await;

        let mut batch = BatchOutcome::default();
        for outcome in outcomes {
            match outcome {
                Ok(call) => {
                    if let Some(result) = call.result {
                        batch.results.insert(call.id, result);
                    }
                }
                Err(e) => {
                    tracing::warn!(turn = tracker.turn_id(), error = %e, "tool call could not be driven");
                    batch.errors.push(e);
                }
            }
        }
        batch
    }
}
