//! Generation Orchestrator
//!
//! Structured generation of curricula and per-topic content through an
//! `LlmProvider`, shape validation of the results, and persistence through
//! the curriculum store.

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use superlearn_core::ObjectStreamEvent;
use superlearn_llm::{GenerationRequest, LlmError, LlmProvider};

use crate::models::curriculum::{Curriculum, CurriculumDraft, GeneratedContent, Topic};
use crate::services::curriculum::CurriculumStore;
use crate::utils::error::{AppError, AppResult};

const CURRICULUM_SYSTEM_PROMPT: &str =
    "You are an expert curriculum designer. Respond with valid JSON only.";

const CONTENT_SYSTEM_PROMPT: &str =
    "You are an expert teacher writing clear, well-structured study material. Respond with valid JSON only.";

/// Capacity of the provider-to-orchestrator event channel
const STREAM_CHANNEL_CAPACITY: usize = 32;

fn curriculum_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "topics": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "title": {"type": "string"},
                        "description": {"type": "string"}
                    },
                    "required": ["id", "title", "description"]
                }
            }
        },
        "required": ["title", "topics"]
    })
}

fn content_schema() -> Value {
    let list = json!({"type": "array", "items": {"type": "string"}});
    json!({
        "type": "object",
        "properties": {
            "content": {
                "type": "object",
                "properties": {
                    "overview": {"type": "string"},
                    "keyConcepts": list,
                    "practicalExamples": list,
                    "importantPoints": list,
                    "exercises": list
                },
                "required": ["overview", "keyConcepts", "practicalExamples", "importantPoints", "exercises"]
            }
        },
        "required": ["content"]
    })
}

fn curriculum_prompt(input: &str) -> String {
    format!(
        "Create a comprehensive learning curriculum for: \"{input}\"\n\n\
         Return a JSON object with a \"title\" (e.g. \"Learning [Subject]\") and a \"topics\" array; \
         each topic has an \"id\", a \"title\" and a brief \"description\" of what will be learned.\n\n\
         Create 8-12 topics that progress logically from beginner to advanced concepts. \
         Each topic should be substantial enough for a focused learning session."
    )
}

fn content_prompt(topic: &str, curriculum_title: &str) -> String {
    format!(
        "Create detailed learning content for the topic: \"{topic}\"\n\n\
         Context: This is part of a curriculum for learning \"{curriculum_title}\"\n\n\
         Provide an overview, key concepts and explanations, practical examples, \
         important points to remember, and suggested exercises or practice."
    )
}

/// Where generated content is persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTarget {
    pub curriculum_id: String,
    pub topic_id: String,
}

/// Progress of a streamed content generation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentStreamEvent {
    /// Fields received so far
    Partial { content: GeneratedContent },
    /// Recoverable problem reported by the provider
    Error { message: String },
    /// Final content, after persistence
    Complete { content: GeneratedContent, stored: bool },
}

/// Validate a generated curriculum object.
///
/// Requires a non-empty string `title` and a `topics` array of objects.
/// Topic ids may be strings or numbers; missing ids are left empty for the
/// store to assign.
pub fn parse_curriculum(value: &Value) -> AppResult<CurriculumDraft> {
    let invalid = || AppError::generation("Invalid curriculum structure");

    let title = value
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(invalid)?;
    let topics = value.get("topics").and_then(Value::as_array).ok_or_else(invalid)?;

    let text = |topic: &Value, key: &str| match topic.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let topics = topics
        .iter()
        .map(|topic| {
            if !topic.is_object() {
                return Err(invalid());
            }
            Ok(Topic::new(
                text(topic, "id"),
                text(topic, "title"),
                text(topic, "description"),
            ))
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(CurriculumDraft {
        title: title.to_string(),
        topics,
    })
}

/// Read content from a generated object.
///
/// Accepts the fields either at the root or nested under `content`. Missing
/// fields are empty; fields of the wrong type are dropped.
pub fn parse_content(value: &Value) -> GeneratedContent {
    let root = match value.get("content") {
        Some(inner @ Value::Object(_)) => inner,
        _ => value,
    };
    let list = |key: &str| -> Vec<String> {
        root.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    };
    GeneratedContent {
        overview: root
            .get("overview")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        key_concepts: list("keyConcepts"),
        practical_examples: list("practicalExamples"),
        important_points: list("importantPoints"),
        exercises: list("exercises"),
    }
}

fn generation_error(err: LlmError, what: &str) -> AppError {
    match err {
        LlmError::Cancelled => AppError::generation(err.to_string()),
        ref e if e.is_parse_error() => {
            tracing::error!(error = %e, "unparsable {} response", what);
            AppError::generation(format!("Failed to parse {} data", what))
        }
        e => {
            tracing::error!(error = %e, "{} generation failed", what);
            AppError::generation(format!("Failed to generate {}", what))
        }
    }
}

pub struct GenerationOrchestrator {
    provider: Arc<dyn LlmProvider>,
    curricula: Arc<CurriculumStore>,
}

impl GenerationOrchestrator {
    pub fn new(provider: Arc<dyn LlmProvider>, curricula: Arc<CurriculumStore>) -> Self {
        Self { provider, curricula }
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Generate a curriculum draft for `input`.
    ///
    /// Ids come from the model; duplicates are resolved when the draft is saved.
    pub async fn generate_curriculum(&self, input: &str) -> AppResult<CurriculumDraft> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AppError::validation("Invalid input provided"));
        }

        let request = GenerationRequest::new(curriculum_prompt(input))
            .with_system(CURRICULUM_SYSTEM_PROMPT)
            .with_schema("curriculum", curriculum_schema());

        tracing::info!(provider = self.provider.name(), model = self.provider.model(), "generating curriculum");
        let value = self
            .provider
            .generate_object(request)
            .await
            .map_err(|e| generation_error(e, "curriculum"))?;

        let draft = parse_curriculum(&value).map_err(|e| {
            tracing::error!(response = %value, "generated curriculum has invalid structure");
            e
        })?;
        tracing::info!(title = %draft.title, topics = draft.topics.len(), "curriculum generated");
        Ok(draft)
    }

    /// Generate a curriculum and persist it
    pub async fn create_curriculum(&self, input: &str) -> AppResult<Curriculum> {
        let draft = self.generate_curriculum(input).await?;
        self.curricula.save(draft)
    }

    fn content_request(topic: &str, curriculum_title: &str) -> AppResult<GenerationRequest> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::validation("Topic is required"));
        }
        Ok(GenerationRequest::new(content_prompt(topic, curriculum_title.trim()))
            .with_system(CONTENT_SYSTEM_PROMPT)
            .with_schema("content", content_schema()))
    }

    fn persist(&self, target: Option<&ContentTarget>, content: &GeneratedContent) -> AppResult<bool> {
        match target {
            Some(target) => {
                self.curricula
                    .save_content(&target.curriculum_id, &target.topic_id, content.clone())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Generate content for one topic, persisting it when `target` is given
    pub async fn generate_content(
        &self,
        topic: &str,
        curriculum_title: &str,
        target: Option<&ContentTarget>,
    ) -> AppResult<GeneratedContent> {
        let request = Self::content_request(topic, curriculum_title)?;
        tracing::info!(topic, "generating content");
        let value = self
            .provider
            .generate_object(request)
            .await
            .map_err(|e| generation_error(e, "content"))?;

        let content = parse_content(&value);
        self.persist(target, &content)?;
        Ok(content)
    }

    /// Stream content for one topic.
    ///
    /// Snapshots are sent on `tx` as fields arrive. The final content is
    /// whatever fields are present when the stream completes; it is persisted
    /// (when `target` is given) before the `Complete` event is sent.
    /// Cancelling `cancel` aborts the request without persisting anything.
    pub async fn stream_content(
        &self,
        topic: &str,
        curriculum_title: &str,
        target: Option<ContentTarget>,
        tx: mpsc::Sender<ContentStreamEvent>,
        cancel: CancellationToken,
    ) -> AppResult<GeneratedContent> {
        let request = Self::content_request(topic, curriculum_title)?;
        let (inner_tx, mut inner_rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        let forward = async {
            let mut last: Option<GeneratedContent> = None;
            while let Some(event) = inner_rx.recv().await {
                let outgoing = match event {
                    ObjectStreamEvent::Partial { object } => {
                        let content = parse_content(&object);
                        if last.as_ref() == Some(&content) {
                            continue;
                        }
                        last = Some(content.clone());
                        ContentStreamEvent::Partial { content }
                    }
                    ObjectStreamEvent::Error { message } => ContentStreamEvent::Error { message },
                    ObjectStreamEvent::TextDelta { .. } | ObjectStreamEvent::Complete { .. } => {
                        continue
                    }
                };
                let _ = tx.send(outgoing).await;
            }
        };

        tracing::info!(topic, "streaming content");
        let (result, _) = tokio::join!(
            self.provider.stream_object(request, inner_tx, cancel.clone()),
            forward
        );
        let value = result.map_err(|e| generation_error(e, "content"))?;

        if cancel.is_cancelled() {
            return Err(generation_error(LlmError::Cancelled, "content"));
        }

        let content = parse_content(&value);
        let stored = self.persist(target.as_ref(), &content)?;
        let _ = tx
            .send(ContentStreamEvent::Complete {
                content: content.clone(),
                stored,
            })
            .await;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryKvStore;
    use async_trait::async_trait;
    use superlearn_llm::{LlmResult, ProviderConfig};

    /// Provider answering from a fixed script
    struct ScriptedProvider {
        config: ProviderConfig,
        text: LlmResult<String>,
        snapshots: Vec<Value>,
    }

    impl ScriptedProvider {
        fn text(text: &str) -> Self {
            Self {
                config: ProviderConfig::default(),
                text: Ok(text.to_string()),
                snapshots: Vec::new(),
            }
        }

        fn failing(err: LlmError) -> Self {
            Self {
                config: ProviderConfig::default(),
                text: Err(err),
                snapshots: Vec::new(),
            }
        }

        fn streaming(snapshots: Vec<Value>) -> Self {
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
            let _ = tx.send(ObjectStreamEvent::Complete { stop_reason: None }).await;
            Ok(last)
        }

        async fn health_check(&self) -> LlmResult<()> {
            Ok(())
        }
    }

    fn orchestrator(provider: ScriptedProvider) -> (GenerationOrchestrator, Arc<CurriculumStore>) {
        let store = Arc::new(CurriculumStore::new(Arc::new(MemoryKvStore::new())));
        (
            GenerationOrchestrator::new(Arc::new(provider), store.clone()),
            store,
        )
    }

    #[tokio::test]
    async fn test_generate_curriculum() {
        let (orch, _) = orchestrator(ScriptedProvider::text(
            r#"```json
{"title": "Learning Photosynthesis", "topics": [
  {"id": "1", "title": "Light", "description": "Light reactions"},
  {"id": 2, "title": "Calvin Cycle", "description": "Carbon fixation"}
]}
```"#,
        ));
        let draft = orch.generate_curriculum("photosynthesis").await.unwrap();
        assert_eq!(draft.title, "Learning Photosynthesis");
        assert_eq!(draft.topics[1].id, "2");
    }

    #[tokio::test]
    async fn test_create_curriculum_dedupes_and_persists() {
        let (orch, store) = orchestrator(ScriptedProvider::text(
            r#"{"title": "T", "topics": [{"id": "1", "title": "A"}, {"id": "1", "title": "B"}]}"#,
        ));
        let curriculum = orch.create_curriculum("anything").await.unwrap();
        assert_eq!(curriculum.topics[1].id, "topic-1");
        assert_eq!(store.get_all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_curriculum_errors() {
        let (orch, _) = orchestrator(ScriptedProvider::text("not json at all"));
        let err = orch.generate_curriculum("x").await.unwrap_err();
        assert_eq!(err.public_message(), "Failed to parse curriculum data");

        let (orch, _) = orchestrator(ScriptedProvider::text(r#"{"title": "T", "topics": "nope"}"#));
        let err = orch.generate_curriculum("x").await.unwrap_err();
        assert_eq!(err.public_message(), "Invalid curriculum structure");

        let (orch, _) = orchestrator(ScriptedProvider::failing(LlmError::NetworkError {
            message: "down".to_string(),
        }));
        let err = orch.generate_curriculum("x").await.unwrap_err();
        assert_eq!(err.public_message(), "Failed to generate curriculum");

        let err = orch.generate_curriculum("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_generate_content_partial_and_persisted() {
        let (orch, store) = orchestrator(ScriptedProvider::text(
            r#"{"content": {"overview": "Plants make food", "keyConcepts": ["chlorophyll"]}}"#,
        ));
        let target = ContentTarget {
            curriculum_id: "c1".to_string(),
            topic_id: "t1".to_string(),
        };
        let content = orch
            .generate_content("Photosynthesis", "Biology", Some(&target))
            .await
            .unwrap();
        assert_eq!(content.overview, "Plants make food");
        assert!(content.exercises.is_empty());
        assert_eq!(store.get_content("c1", "t1").unwrap().unwrap().content, content);
    }

    #[tokio::test]
    async fn test_stream_content_emits_snapshots_then_complete() {
        let (orch, store) = orchestrator(ScriptedProvider::streaming(vec![
            json!({"content": {"overview": "Pl"}}),
            json!({"content": {"overview": "Plants"}}),
            json!({"content": {"overview": "Plants"}}),
            json!({"content": {"overview": "Plants", "exercises": ["Draw a leaf"]}}),
        ]));
        let (tx, mut rx) = mpsc::channel(16);
        let target = ContentTarget {
            curriculum_id: "c1".to_string(),
            topic_id: "t1".to_string(),
        };

        let content = orch
            .stream_content("Leaves", "Botany", Some(target), tx, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(content.exercises, vec!["Draw a leaf"]);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        // Duplicate snapshot is suppressed
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], ContentStreamEvent::Partial { content } if content.overview == "Pl"));
        assert!(matches!(&events[3], ContentStreamEvent::Complete { stored: true, .. }));
        assert!(store.get_content("c1", "t1").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stream_content_cancelled() {
        let (orch, store) = orchestrator(ScriptedProvider::streaming(vec![json!({"overview": "x"})]));
        let (tx, _rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let target = ContentTarget {
            curriculum_id: "c1".to_string(),
            topic_id: "t1".to_string(),
        };

        let err = orch
            .stream_content("Leaves", "Botany", Some(target), tx, cancel)
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "generation cancelled");
        assert!(store.get_content("c1", "t1").unwrap().is_none());
    }

    #[test]
    fn test_parse_content_root_level_and_wrong_types() {
        let content = parse_content(&json!({"overview": "o", "keyConcepts": ["a", 3, "b"], "exercises": "x"}));
        assert_eq!(content.overview, "o");
        assert_eq!(content.key_concepts, vec!["a", "b"]);
        assert!(content.exercises.is_empty());
    }

    #[test]
    fn test_parse_curriculum_rejects_non_object_topic() {
        let err = parse_curriculum(&json!({"title": "T", "topics": ["a"]})).unwrap_err();
        assert_eq!(err.public_message(), "Invalid curriculum structure");
        assert!(parse_curriculum(&json!({"title": "", "topics": []})).is_err());
    }
}
