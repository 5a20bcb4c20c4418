//! Curriculum and Content Generation Integration Tests

use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use superlearn::services::generation::{ContentStreamEvent, ContentTarget};
use superlearn::utils::error::AppError;
use superlearn_llm::LlmError;

use crate::support::{
    content_value, sqlite_store, state_over, state_with, ScriptedProvider, CURRICULUM_JSON,
};

#[tokio::test]
async fn test_generated_curriculum_is_deduped_and_persisted() {
    let dir = TempDir::new().unwrap();
    let (kv, db) = sqlite_store(dir.path());
    let state = state_over(kv, Some(db), ScriptedProvider::text(CURRICULUM_JSON));

    let curriculum = state
        .generation()
        .create_curriculum("I want to learn Rust")
        .await
        .unwrap();
    let ids: Vec<_> = curriculum.topics.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "topic-1", "3"]);

    let (kv, db) = sqlite_store(dir.path());
    let reopened = state_over(kv, Some(db), ScriptedProvider::text("{}"));
    assert_eq!(
        reopened.curricula().get_by_id(&curriculum.id).unwrap(),
        Some(curriculum)
    );
}

#[tokio::test]
async fn test_malformed_curriculum_is_a_generation_error() {
    let state = state_with(ScriptedProvider::text(r#"{"title": "No topics"}"#));
    let err = state.generation().create_curriculum("rust").await.unwrap_err();
    assert!(matches!(err, AppError::Generation(_)));
    assert!(state.curricula().get_all().unwrap().is_empty());

    let state = state_with(ScriptedProvider::text("not json at all"));
    let err = state.generation().create_curriculum("rust").await.unwrap_err();
    assert_eq!(err.public_message(), "Failed to parse curriculum data");
}

#[tokio::test]
async fn test_provider_failure_is_generic() {
    let state = state_with(ScriptedProvider::failing(LlmError::NetworkError {
        message: "connection reset".to_string(),
    }));
    let err = state
        .generation()
        .generate_content("Ownership", "Rust", None)
        .await
        .unwrap_err();
    assert_eq!(err.public_message(), "Failed to generate content");
}

#[tokio::test]
async fn test_regenerating_content_overwrites() {
    let state = state_with(ScriptedProvider::text(&content_value().to_string()));
    let target = ContentTarget {
        curriculum_id: "c1".to_string(),
        topic_id: "t1".to_string(),
    };

    state
        .generation()
        .generate_content("Ownership", "Rust", Some(&target))
        .await
        .unwrap();
    state
        .curricula()
        .save_content("c1", "t1", Default::default())
        .unwrap();
    let content = state
        .generation()
        .generate_content("Ownership", "Rust", Some(&target))
        .await
        .unwrap();

    let stored = state.curricula().all_content().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content, content);
    assert_eq!(content.important_points, vec!["One owner at a time"]);
}

#[tokio::test]
async fn test_stream_persists_last_snapshot() {
    let state = state_with(ScriptedProvider::streaming(vec![
        json!({"content": {"overview": "Own"}}),
        json!({"content": {"overview": "Own"}}),
        json!({"content": {"overview": "Ownership", "keyConcepts": ["Move"]}}),
    ]));
    let target = ContentTarget {
        curriculum_id: "c1".to_string(),
        topic_id: "t1".to_string(),
    };
    let (tx, mut rx) = mpsc::channel(16);

    let content = state
        .generation()
        .stream_content("Ownership", "Rust", Some(target), tx, CancellationToken::new())
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    let partials = events
        .iter()
        .filter(|e| matches!(e, ContentStreamEvent::Partial { .. }))
        .count();
    assert_eq!(partials, 2);
    assert_eq!(
        events.last(),
        Some(&ContentStreamEvent::Complete {
            content: content.clone(),
            stored: true
        })
    );
    assert_eq!(
        state.curricula().get_content("c1", "t1").unwrap().unwrap().content,
        content
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_streams_persist_every_topic() {
    let dir = TempDir::new().unwrap();
    let (kv, db) = sqlite_store(dir.path());
    let state = state_over(
        kv,
        Some(db),
        ScriptedProvider::streaming(vec![json!({"content": {"overview": "Parallel"}})]),
    );

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let state = state.clone();
            tokio::spawn(async move {
                let (tx, _rx) = mpsc::channel(16);
                state
                    .generation()
                    .stream_content(
                        "Ownership",
                        "Rust",
                        Some(ContentTarget {
                            curriculum_id: "c1".to_string(),
                            topic_id: format!("t{}", i),
                        }),
                        tx,
                        CancellationToken::new(),
                    )
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut topics: Vec<_> = state
        .curricula()
        .all_content()
        .unwrap()
        .into_iter()
        .map(|c| c.topic_id)
        .collect();
    topics.sort();
    assert_eq!(topics, (0..8).map(|i| format!("t{}", i)).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_cancelled_stream_stores_nothing() {
    let state = state_with(ScriptedProvider::streaming(vec![json!({"overview": "x"})]));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let (tx, _rx) = mpsc::channel(16);

    let err = state
        .generation()
        .stream_content(
            "Ownership",
            "Rust",
            Some(ContentTarget {
                curriculum_id: "c1".to_string(),
                topic_id: "t1".to_string(),
            }),
            tx,
            cancel,
        )
        .await
        .unwrap_err();
    assert_eq!(err.public_message(), "generation cancelled");
    assert!(state.curricula().all_content().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_curriculum_drops_its_content() {
    let state = state_with(ScriptedProvider::text(CURRICULUM_JSON));
    let curriculum = state.generation().create_curriculum("rust").await.unwrap();
    state
        .curricula()
        .save_content(&curriculum.id, "1", Default::default())
        .unwrap();

    assert!(state.curricula().delete(&curriculum.id).unwrap());
    assert!(state.curricula().all_content().unwrap().is_empty());
    assert!(state.curricula().get_by_id(&curriculum.id).unwrap().is_none());
}
