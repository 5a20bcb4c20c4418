//! Application State
//!
//! Shared state handed to every route, containing all services.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use superlearn_llm::{LlmProvider, OpenAIProvider};
use superlearn_tools::{default_registry, ToolDispatcher, ToolRegistry};

use crate::models::settings::{AppConfig, Secrets};
use crate::services::{ChatService, CurriculumStore, GenerationOrchestrator, TemplateStore};
use crate::storage::{Database, KeyValueStore};
use crate::utils::error::{AppError, AppResult};

/// Application state shared by the router. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Services>,
}

struct Services {
    config: AppConfig,
    /// Present when persistence is SQLite-backed
    database: Option<Database>,
    templates: TemplateStore,
    curricula: Arc<CurriculumStore>,
    chats: Arc<ChatService>,
    generation: GenerationOrchestrator,
    dispatcher: Arc<ToolDispatcher>,
    /// Cancelled on shutdown; request tokens are children of it
    shutdown: CancellationToken,
}

impl AppState {
    /// Wire every service from configuration and environment secrets
    pub fn from_config(
        config: AppConfig,
        secrets: &Secrets,
        store: Arc<dyn KeyValueStore>,
        database: Option<Database>,
    ) -> AppResult<Self> {
        config.validate().map_err(AppError::config)?;
        let provider_config = config
            .provider_config(secrets.openai_api_key.clone())
            .map_err(AppError::config)?;
        let provider = OpenAIProvider::new(provider_config)
            .map_err(|e| AppError::config(format!("Failed to create LLM provider: {}", e)))?;
        let registry = default_registry(&config.search_settings(secrets));

        tracing::info!(
            provider = provider.name(),
            model = provider.model(),
            search = %config.search_provider,
            tools = registry.len(),
            "services configured"
        );
        Ok(Self::with_parts(config, store, database, Arc::new(provider), registry))
    }

    /// Wire services around an explicit provider and tool set
    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        database: Option<Database>,
        provider: Arc<dyn LlmProvider>,
        registry: ToolRegistry,
    ) -> Self {
        let dispatcher = Arc::new(
            ToolDispatcher::new(Arc::new(registry))
                .with_timeout(Duration::from_secs(config.tool_timeout_secs)),
        );
        let curricula = Arc::new(CurriculumStore::new(store.clone()));

        Self {
            inner: Arc::new(Services {
                templates: TemplateStore::new(store.clone()),
                chats: Arc::new(ChatService::new(store, dispatcher.clone())),
                generation: GenerationOrchestrator::new(provider, curricula.clone()),
                curricula,
                dispatcher,
                database,
                config,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Whether the backing database answers; `true` without one
    pub fn is_storage_healthy(&self) -> bool {
        self.inner
            .database
            .as_ref()
            .map_or(true, Database::is_healthy)
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.inner.templates
    }

    pub fn curricula(&self) -> &CurriculumStore {
        &self.inner.curricula
    }

    pub fn chats(&self) -> &Arc<ChatService> {
        &self.inner.chats
    }

    pub fn generation(&self) -> &GenerationOrchestrator {
        &self.inner.generation
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.inner.dispatcher
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.inner.dispatcher.registry()
    }

    /// Token for one request, cancelled at the latest on shutdown
    pub fn request_token(&self) -> CancellationToken {
        self.inner.shutdown.child_token()
    }

    /// Cancel every in-flight generation and tool call
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}
