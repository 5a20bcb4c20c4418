//! Tool Calling Integration Tests
//!
//! Verifies tool usage end to end:
//! - Default registry contents and descriptors
//! - Mock search fallback without credentials
//! - Lifecycle ordering of tracked calls in a concurrent batch
//! - Timeouts and cancellation surfacing as failed results
//! - Chat tool turns

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use superlearn::models::chat::ToolCallRequest;
use superlearn_tools::{
    default_registry, SearchSettings, Tool, ToolCallStatus, ToolCallTracker, ToolDispatcher,
    ToolExecutionContext, ToolParameters, ToolRegistry, ToolResult, CANCELLED_ERROR,
};

use crate::support::{state_with, ScriptedProvider};

fn registry() -> Arc<ToolRegistry> {
    Arc::new(default_registry(&SearchSettings::default()))
}

/// Tool that never answers within any sane timeout
struct Stuck;

#[async_trait]
impl Tool for Stuck {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Never finishes"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _ctx: &ToolExecutionContext, _params: &ToolParameters) -> ToolResult {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        ToolResult::ok(Value::Null)
    }
}

#[test]
fn test_default_registry_descriptors() {
    let registry = registry();
    let definitions = registry.definitions();
    let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["academic_search", "web_search", "calculator"]);
    for definition in &definitions {
        assert!(!definition.description.is_empty());
        assert_eq!(definition.parameters["type"], "object");
    }
    assert!(registry.get("teleport").is_none());
}

#[tokio::test]
async fn test_academic_search_without_credentials_returns_mock_set() {
    let dispatcher = ToolDispatcher::new(registry());
    let result = dispatcher
        .execute("academic_search", json!({"query": "quantum computing"}), &CancellationToken::new())
        .await;

    assert!(result.success);
    assert!(result.is_consistent());
    let papers = result.data.as_ref().unwrap().as_array().unwrap();
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0]["title"], "Sample Academic Paper on quantum computing");
    assert_eq!(papers[0]["citations"], 42);
    let metadata = result.metadata.unwrap();
    assert_eq!(metadata.sources, Some(vec!["Mock Database".to_string()]));
    assert_eq!(metadata.extra["totalResults"], 1);
}

#[tokio::test]
async fn test_web_search_mock_respects_limit() {
    let dispatcher = ToolDispatcher::new(registry());
    let result = dispatcher
        .execute("web_search", json!({"query": "rust", "limit": 2}), &CancellationToken::new())
        .await;
    let hits = result.data.unwrap();
    assert_eq!(hits.as_array().unwrap().len(), 2);
    assert_eq!(hits[1]["title"], "rust - Wikipedia");
    assert_eq!(result.metadata.unwrap().extra["totalResults"], 3);
}

#[tokio::test]
async fn test_invalid_calls_fail_without_raising() {
    let dispatcher = ToolDispatcher::new(registry());
    let cancel = CancellationToken::new();

    let missing_query = dispatcher.execute("web_search", json!({}), &cancel).await;
    assert!(!missing_query.success);
    assert!(missing_query.is_consistent());

    let unknown = dispatcher.execute("teleport", json!({}), &cancel).await;
    assert_eq!(unknown.error.as_deref(), Some("Unknown tool: teleport"));

    let bad_math = dispatcher
        .execute("calculator", json!({"expression": "2 +"}), &cancel)
        .await;
    assert!(!bad_math.success);
    assert!(bad_math.error.unwrap().starts_with("Calculation failed"));
}

#[tokio::test]
async fn test_batch_transitions_are_ordered_per_call() {
    let dispatcher = ToolDispatcher::new(registry());
    let tracker = ToolCallTracker::new("turn-order");
    let mut updates = tracker.subscribe();

    let ids = vec![
        tracker.create("calculator", json!({"expression": "2 ^ 10"})).await.unwrap(),
        tracker.create("web_search", json!({"query": "tokio"})).await.unwrap(),
        tracker.create("calculator", json!({"expression": "1 / 0"})).await.unwrap(),
        tracker.create("academic_search", json!({"limit": 3})).await.unwrap(),
    ];
    let outcome = dispatcher.run_batch(&tracker, &CancellationToken::new()).await;
    assert_eq!(outcome.results.len(), 4);
    assert!(outcome.errors.is_empty());

    let mut seen: HashMap<String, Vec<ToolCallStatus>> = HashMap::new();
    while let Ok(call) = updates.try_recv() {
        assert!(call.is_consistent());
        seen.entry(call.id).or_default().push(call.status);
    }
    for id in &ids {
        let states = &seen[id];
        assert_eq!(states.len(), 3, "call {} states: {:?}", id, states);
        assert_eq!(states[0], ToolCallStatus::Pending);
        assert_eq!(states[1], ToolCallStatus::Running);
        assert!(states[2].is_terminal());
    }

    assert_eq!(outcome.results[&ids[0]].data, Some(json!(1024.0)));
    assert!(!outcome.results[&ids[2]].success);
    assert!(!outcome.results[&ids[3]].success);
    assert_eq!(
        tracker.get(&ids[3]).await.unwrap().status,
        ToolCallStatus::Failed
    );
}

#[tokio::test(start_paused = true)]
async fn test_stuck_tool_times_out() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(Stuck));
    let dispatcher = ToolDispatcher::new(Arc::new(registry)).with_timeout(Duration::from_secs(2));

    let result = dispatcher
        .execute("calculator", json!({"expression": "1"}), &CancellationToken::new())
        .await;
    assert_eq!(
        result.error.as_deref(),
        Some("Tool 'calculator' timed out after 2s")
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_is_distinguishable() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(Stuck));
    let dispatcher = ToolDispatcher::new(Arc::new(registry));
    let tracker = ToolCallTracker::new("turn-cancel");
    let id = tracker
        .create("calculator", json!({"expression": "1"}))
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });
    let outcome = dispatcher.run_batch(&tracker, &cancel).await;

    let result = &outcome.results[&id];
    assert_eq!(result.error.as_deref(), Some(CANCELLED_ERROR));
    assert_eq!(
        result.metadata.as_ref().unwrap().extra["cancelled"],
        json!(true)
    );
}

#[tokio::test]
async fn test_chat_tool_turn_is_recorded() {
    let state = state_with(ScriptedProvider::text("{}"));
    let chat = state.chats().create(Some("Homework".to_string())).unwrap();

    let message = state
        .chats()
        .run_tool_turn(
            &chat.id,
            vec![
                ToolCallRequest {
                    tool: "calculator".to_string(),
                    parameters: json!({"expression": "(3 + 4) * 2"}),
                },
                ToolCallRequest {
                    tool: "web_search".to_string(),
                    parameters: json!({"query": "chlorophyll"}),
                },
            ],
            Some("turn-hw".to_string()),
            state.request_token(),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(message.content, "Ran 2 tool calls: 2 succeeded, 0 failed");
    assert_eq!(message.turn_id.as_deref(), Some("turn-hw"));
    let stored = state.chats().get(&chat.id).unwrap().unwrap();
    let calls = stored.messages[0].tool_calls.as_ref().unwrap();
    assert!(calls.iter().all(|c| c.status == ToolCallStatus::Completed));
    assert!(calls.iter().all(|c| c.completed_at.is_some()));
    assert_eq!(
        state.chats().turn_snapshot("turn-hw").await.unwrap(),
        *calls
    );
}
