//! Chat Service
//!
//! Chats and their messages, plus tool turns: a batch of tool calls run for
//! one chat whose final state is appended as an assistant message.

use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use superlearn_tools::{ToolCall, ToolCallTracker, ToolDispatcher};

use crate::models::chat::{Chat, ChatMessage, MessageRole, ToolCallRequest};
use crate::storage::kv::{load_json, save_json, KeyValueStore, WriteLock};
use crate::utils::error::{AppError, AppResult};

pub const CHATS_KEY: &str = "superlearn_chats";

/// Finished turns kept around for late readers
const RETAINED_TURNS: usize = 64;

#[derive(Default)]
struct TurnRegistry {
    trackers: HashMap<String, ToolCallTracker>,
    finished: VecDeque<String>,
}

pub struct ChatService {
    store: Arc<dyn KeyValueStore>,
    dispatcher: Arc<ToolDispatcher>,
    turns: RwLock<TurnRegistry>,
    writes: WriteLock,
}

impl ChatService {
    pub fn new(store: Arc<dyn KeyValueStore>, dispatcher: Arc<ToolDispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            turns: RwLock::new(TurnRegistry::default()),
            writes: WriteLock::new(),
        }
    }

    pub fn list(&self) -> AppResult<Vec<Chat>> {
        load_json(self.store.as_ref(), CHATS_KEY)
    }

    pub fn get(&self, id: &str) -> AppResult<Option<Chat>> {
        Ok(self.list()?.into_iter().find(|c| c.id == id))
    }

    /// Create and persist an empty chat
    pub fn create(&self, title: Option<String>) -> AppResult<Chat> {
        let chat = Chat::new(title);
        self.save(&chat)?;
        Ok(chat)
    }

    /// Upsert by id
    pub fn save(&self, chat: &Chat) -> AppResult<()> {
        let _guard = self.writes.acquire()?;
        self.upsert(chat)
    }

    /// Caller holds the write lock
    fn upsert(&self, chat: &Chat) -> AppResult<()> {
        let mut chats = self.list()?;
        match chats.iter_mut().find(|c| c.id == chat.id) {
            Some(existing) => *existing = chat.clone(),
            None => chats.push(chat.clone()),
        }
        save_json(self.store.as_ref(), CHATS_KEY, &chats)
    }

    pub fn delete(&self, id: &str) -> AppResult<bool> {
        let _guard = self.writes.acquire()?;
        let mut chats = self.list()?;
        let before = chats.len();
        chats.retain(|c| c.id != id);
        if chats.len() == before {
            return Ok(false);
        }
        save_json(self.store.as_ref(), CHATS_KEY, &chats)?;
        Ok(true)
    }

    /// Append a message. Returns `None` when the chat does not exist.
    pub fn add_message(&self, chat_id: &str, message: ChatMessage) -> AppResult<Option<Chat>> {
        let _guard = self.writes.acquire()?;
        let Some(mut chat) = self.get(chat_id)? else {
            return Ok(None);
        };
        chat.push_message(message);
        self.upsert(&chat)?;
        Ok(Some(chat))
    }

    /// Live (or recently finished) tool calls of a turn
    pub async fn turn_snapshot(&self, turn_id: &str) -> Option<Vec<ToolCall>> {
        let tracker = self.turns.read().await.trackers.get(turn_id).cloned()?;
        Some(tracker.snapshot().await)
    }

    async fn register_turn(&self, tracker: &ToolCallTracker) -> AppResult<()> {
        let mut turns = self.turns.write().await;
        if turns.trackers.contains_key(tracker.turn_id()) {
            return Err(AppError::validation(format!(
                "Turn already exists: {}",
                tracker.turn_id()
            )));
        }
        turns
            .trackers
            .insert(tracker.turn_id().to_string(), tracker.clone());
        Ok(())
    }

    async fn retire_turn(&self, turn_id: &str) {
        let mut turns = self.turns.write().await;
        turns.finished.push_back(turn_id.to_string());
        while turns.finished.len() > RETAINED_TURNS {
            if let Some(old) = turns.finished.pop_front() {
                turns.trackers.remove(&old);
            }
        }
    }

    /// Run a batch of tool calls for a chat.
    ///
    /// Waits for every call; individual failures are reported per call. The
    /// final calls are appended to the chat as one assistant message, which
    /// is returned. `None` when the chat does not exist.
    ///
    /// The turn runs on its own task: a caller that goes away does not stop
    /// it, and its calls still reach a terminal state and get recorded.
    /// Only `cancel` stops the calls early.
    pub async fn run_tool_turn(
        self: &Arc<Self>,
        chat_id: &str,
        requests: Vec<ToolCallRequest>,
        turn_id: Option<String>,
        cancel: CancellationToken,
    ) -> AppResult<Option<ChatMessage>> {
        if requests.is_empty() {
            return Err(AppError::validation("At least one tool call is required"));
        }
        if self.get(chat_id)?.is_none() {
            return Ok(None);
        }

        let turn_id = turn_id
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let service = Arc::clone(self);
        let chat_id = chat_id.to_string();

        tokio::spawn(async move {
            let tracker = ToolCallTracker::new(turn_id.clone());
            service.register_turn(&tracker).await?;
            let outcome = service.drive_turn(&chat_id, &tracker, requests, &cancel).await;
            service.retire_turn(&turn_id).await;
            outcome
        })
        .await
        .map_err(|e| AppError::internal(format!("Tool turn task failed: {}", e)))?
    }

    async fn drive_turn(
        &self,
        chat_id: &str,
        tracker: &ToolCallTracker,
        requests: Vec<ToolCallRequest>,
        cancel: &CancellationToken,
    ) -> AppResult<Option<ChatMessage>> {
        for request in requests {
            tracker.create(request.tool, request.parameters).await?;
        }

        let turn_id = tracker.turn_id();
        let pending_calls = tracker.len().await;
        let started = Utc::now();
        tracing::info!(chat_id, turn = %turn_id, calls = pending_calls, "tool turn started");
        let outcome = self.dispatcher.run_batch(tracker, cancel).await;
        tracing::info!(
            chat_id,
            turn = %turn_id,
            succeeded = outcome.succeeded(),
            failed = outcome.failed(),
            elapsed_ms = (Utc::now() - started).num_milliseconds(),
            "tool turn finished"
        );

        let calls = tracker.snapshot().await;
        let summary = format!(
            "Ran {} tool call{}: {} succeeded, {} failed",
            calls.len(),
            if calls.len() == 1 { "" } else { "s" },
            outcome.succeeded(),
            outcome.failed()
        );
        let message = ChatMessage::new(MessageRole::Assistant, summary)
            .with_tool_calls(calls)
            .with_turn_id(turn_id);

        Ok(self
            .add_message(chat_id, message.clone())?
            .map(|_| message))
    }
}
