#![allow(dead_code)]

//! Test doubles shared by the integration tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use superlearn::models::settings::AppConfig;
use superlearn::state::AppState;
use superlearn::storage::{Database, KeyValueStore, MemoryKvStore, SqliteKvStore};
use superlearn_core::ObjectStreamEvent;
use superlearn_llm::{GenerationRequest, LlmError, LlmProvider, LlmResult, ProviderConfig};
use superlearn_tools::{default_registry, SearchSettings};

/// Provider answering every request from a fixed script
pub struct ScriptedProvider {
    config: ProviderConfig,
    text: LlmResult<String>,
    snapshots: Vec<Value>,
}

impl ScriptedProvider {
    pub fn text(text: &str) -> Self {
        Self {
            config: ProviderConfig::default(),
            text: Ok(text.to_string()),
            snapshots: Vec::new(),
        }
    }

    pub fn failing(err: LlmError) -> Self {
        Self {
            config: ProviderConfig::default(),
            text: Err(err),
            snapshots: Vec::new(),
        }
    }

    pub fn streaming(snapshots: Vec<Value>) -> Self {
        Self {
            config: ProviderConfig::default(),
            text: Ok(String::new()),
            snapshots,
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "script-1"
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate_text(&self, _request: GenerationRequest) -> LlmResult<String> {
        self.text.clone()
    }

    async fn stream_object(
        &self,
        _request: GenerationRequest,
        tx: mpsc::Sender<ObjectStreamEvent>,
        cancel: CancellationToken,
    ) -> LlmResult<Value> {
        let mut last = json!({});
        for snapshot in &self.snapshots {
            if cancel.is_cancelled() {
                return Err(LlmError::Cancelled);
            }
            last = snapshot.clone();
            let _ = tx
                .send(ObjectStreamEvent::Partial {
                    object: snapshot.clone(),
                })
                .await;
        }
        Ok(last)
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }
}

/// A curriculum as a model would return it
pub const CURRICULUM_JSON: &str = r#"{
  "title": "Learning Rust",
  "topics": [
    {"id": "1", "title": "Ownership", "description": "Moves and borrows"},
    {"id": "1", "title": "Traits", "description": "Shared behavior"},
    {"id": 3, "title": "Async", "description": "Futures and executors"}
  ]
}"#;

/// Content nested the way the content schema asks for it
pub fn content_value() -> Value {
    json!({
        "content": {
            "overview": "Ownership decides who frees memory.",
            "keyConcepts": ["Move semantics transfer ownership"],
            "practicalExamples": ["let b = a; // a is moved"],
            "importantPoints": ["One owner at a time"],
            "exercises": ["Fix a use-after-move error"]
        }
    })
}

/// State over an in-memory store with the default (mock-backed) tools
pub fn state_with(provider: ScriptedProvider) -> AppState {
    state_over(Arc::new(MemoryKvStore::new()), None, provider)
}

pub fn state_over(
    store: Arc<dyn KeyValueStore>,
    database: Option<Database>,
    provider: ScriptedProvider,
) -> AppState {
    AppState::with_parts(
        AppConfig::default(),
        store,
        database,
        Arc::new(provider),
        default_registry(&SearchSettings::default()),
    )
}

/// SQLite-backed store in a temp directory
pub fn sqlite_store(dir: &std::path::Path) -> (Arc<dyn KeyValueStore>, Database) {
    let database = Database::open(&dir.join("data.db")).unwrap();
    (Arc::new(SqliteKvStore::new(database.clone())), database)
}
