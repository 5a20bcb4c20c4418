//! Tool Call Lifecycle
//!
//! A `ToolCall` moves strictly `pending -> running -> completed | failed`.
//! `ToolCallTracker` holds the calls issued by one conversation turn, applies
//! transitions atomically and broadcasts every change so a presentation
//! layer can render progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::error::ToolError;
use crate::executor::ToolResult;
use crate::params::ToolParameters;

/// Capacity of the per-turn update channel
const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ToolCallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolCallStatus::Completed | ToolCallStatus::Failed)
    }

    /// Whether `next` is the immediate successor of `self`
    pub fn can_transition_to(&self, next: ToolCallStatus) -> bool {
        matches!(
            (self, next),
            (ToolCallStatus::Pending, ToolCallStatus::Running)
                | (ToolCallStatus::Running, ToolCallStatus::Completed)
                | (ToolCallStatus::Running, ToolCallStatus::Failed)
        )
    }
}

impl std::fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolCallStatus::Pending => write!(f, "pending"),
            ToolCallStatus::Running => write!(f, "running"),
            ToolCallStatus::Completed => write!(f, "completed"),
            ToolCallStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One tracked tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub id: String,
    pub tool: String,
    pub parameters: Value,
    pub status: ToolCallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ToolResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ToolCall {
    /// Create a pending call with a fresh id
    pub fn new(tool: impl Into<String>, parameters: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tool: tool.into(),
            parameters,
            status: ToolCallStatus::Pending,
            result: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    fn transition(&mut self, next: ToolCallStatus) -> Result<(), ToolError> {
        if !self.status.can_transition_to(next) {
            return Err(ToolError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// pending -> running
    pub fn start(&mut self) -> Result<(), ToolError> {
        self.transition(ToolCallStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// running -> completed (success) or failed (failure), storing the result
    pub fn finish(&mut self, result: ToolResult) -> Result<(), ToolError> {
        let next = if result.success {
            ToolCallStatus::Completed
        } else {
            ToolCallStatus::Failed
        };
        self.transition(next)?;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `result` and `completedAt` are present exactly in terminal states
    pub fn is_consistent(&self) -> bool {
        let terminal = self.is_terminal();
        terminal == self.result.is_some()
            && terminal == self.completed_at.is_some()
            && (self.status == ToolCallStatus::Pending) == self.started_at.is_none()
    }

    /// Parse the stored parameters into their typed form
    pub fn typed_parameters(&self) -> Result<ToolParameters, ToolError> {
        ToolParameters::from_call(&self.tool, self.parameters.clone())
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    calls: Vec<ToolCall>,
    index: HashMap<String, usize>,
}

/// Tool calls of one conversation turn.
///
/// Cheap to clone; clones share state. Transitions are applied under a write
/// lock, so no reader ever observes a call out of order.
#[derive(Debug, Clone)]
pub struct ToolCallTracker {
    turn_id: String,
    state: Arc<RwLock<TrackerState>>,
    updates: broadcast::Sender<ToolCall>,
}

impl ToolCallTracker {
    pub fn new(turn_id: impl Into<String>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            turn_id: turn_id.into(),
            state: Arc::new(RwLock::new(TrackerState::default())),
            updates,
        }
    }

    pub fn turn_id(&self) -> &str {
        &self.turn_id
    }

    /// Receive every call after each change
    pub fn subscribe(&self) -> broadcast::Receiver<ToolCall> {
        self.updates.subscribe()
    }

    fn publish(&self, call: &ToolCall) {
        // No subscribers is fine
        let _ = self.updates.send(call.clone());
    }

    /// Start tracking a pending call. Returns its id.
    pub async fn track(&self, call: ToolCall) -> Result<String, ToolError> {
        if call.status != ToolCallStatus::Pending {
            return Err(ToolError::InvalidTransition {
                id: call.id.clone(),
                from: call.status,
                to: ToolCallStatus::Pending,
            });
        }
        let mut state = self.state.write().await;
        if state.index.contains_key(&call.id) {
            return Err(ToolError::InvalidTransition {
                id: call.id.clone(),
                from: ToolCallStatus::Pending,
                to: ToolCallStatus::Pending,
            });
        }
        let id = call.id.clone();
        let position = state.calls.len();
        state.index.insert(id.clone(), position);
        state.calls.push(call);
        self.publish(&state.calls[position]);
        Ok(id)
    }

    /// Create and track a pending call for `tool`
    pub async fn create(&self, tool: impl Into<String>, parameters: Value) -> Result<String, ToolError> {
        self.track(ToolCall::new(tool, parameters)).await
    }

    async fn update<F>(&self, id: &str, apply: F) -> Result<ToolCall, ToolError>
    where
        F: FnOnce(&mut ToolCall) -> Result<(), ToolError>,
    {
        let mut state = self.state.write().await;
        let position = *state
            .index
            .get(id)
            .ok_or_else(|| ToolError::UnknownCall(id.to_string()))?;
        let call = &mut state.calls[position];
        apply(call)?;
        let updated = call.clone();
        self.publish(&updated);
        Ok(updated)
    }

    /// pending -> running
    pub async fn start(&self, id: &str) -> Result<ToolCall, ToolError> {
        self.update(id, |call| call.start()).await
    }

    /// running -> completed | failed
    pub async fn finish(&self, id: &str, result: ToolResult) -> Result<ToolCall, ToolError> {
        self.update(id, move |call| call.finish(result)).await
    }

    pub async fn get(&self, id: &str) -> Option<ToolCall> {
        let state = self.state.read().await;
        state.index.get(id).map(|&i| state.calls[i].clone())
    }

    /// All calls in creation order
    pub async fn snapshot(&self) -> Vec<ToolCall> {
        self.state.read().await.calls.clone()
    }

    /// Ids of calls still waiting to start
    pub async fn pending_ids(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| c.status == ToolCallStatus::Pending)
            .map(|c| c.id.clone())
            .collect()
    }

    pub async fn all_terminal(&self) -> bool {
        self.state.read().await.calls.iter().all(ToolCall::is_terminal)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.calls.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
