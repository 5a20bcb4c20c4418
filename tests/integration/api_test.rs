//! HTTP API Integration Tests
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use superlearn::models::curriculum::{CurriculumDraft, Topic};
use superlearn::router;

use crate::support::{content_value, state_with, ScriptedProvider, CURRICULUM_JSON};

fn app(provider: ScriptedProvider) -> Router {
    router(state_with(provider))
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, text) = send_raw(app, request(method, uri, body)).await;
    let value = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let app = app(ScriptedProvider::text("{}"));
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "superlearn");
}

#[tokio::test]
async fn test_missing_fields_are_bad_requests() {
    let app = app(ScriptedProvider::text("{}"));
    let cases = [
        ("/api/generate-curriculum", json!({}), "Invalid input provided"),
        ("/api/generate-content", json!({"curriculumTitle": "Rust"}), "Topic is required"),
        ("/api/tools/web-search", json!({"query": ""}), "Query parameter is required"),
        ("/api/tools/academic-search", json!({}), "Query parameter is required"),
        ("/api/tools/calculator", json!({}), "Expression is required"),
    ];
    for (uri, body, message) in cases {
        let (status, body) = send(&app, Method::POST, uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], message, "{}", uri);
    }
}

#[tokio::test]
async fn test_malformed_json_reports_error_body() {
    let app = app(ScriptedProvider::text("{}"));
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/tools/web-search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{oops"))
        .unwrap();
    let (status, text) = send_raw(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&text).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_curriculum_lifecycle() {
    let app = app(ScriptedProvider::text(CURRICULUM_JSON));
    let (status, curriculum) = send(
        &app,
        Method::POST,
        "/api/generate-curriculum",
        Some(json!({"input": "I want to learn Rust"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(curriculum["title"], "Learning Rust");
    assert_eq!(curriculum["topics"][1]["id"], "topic-1");
    let id = curriculum["id"].as_str().unwrap().to_string();

    let (_, list) = send(&app, Method::GET, "/api/curricula", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let uri = format!("/api/curricula/{}", id);
    let (status, fetched) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["createdAt"], curriculum["createdAt"]);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": true}));

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id));
}

#[tokio::test]
async fn test_generation_failure_is_server_error() {
    let app = app(ScriptedProvider::text("the model rambled"));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/generate-curriculum",
        Some(json!({"input": "rust"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to parse curriculum data");
}

#[tokio::test]
async fn test_content_is_persisted_and_hydrated() {
    let state = state_with(ScriptedProvider::text(&content_value().to_string()));
    let curriculum = state
        .curricula()
        .save(CurriculumDraft {
            title: "Learning Rust".to_string(),
            topics: vec![
                Topic::new("1", "Ownership", "Moves and borrows"),
                Topic::new("2", "Traits", "Shared behavior"),
                Topic::new("3", "Async", "Futures and executors"),
            ],
        })
        .unwrap();
    let app = router(state);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/generate-content",
        Some(json!({
            "curriculumId": curriculum.id,
            "topicId": "3",
            "topic": "Async",
            "curriculumTitle": "Learning Rust"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["overview"], "Ownership decides who frees memory.");

    let uri = format!("/api/curricula/{}", curriculum.id);
    let (_, fetched) = send(&app, Method::GET, &uri, None).await;
    assert!(fetched["topics"][0].get("content").map_or(true, Value::is_null));
    assert_eq!(fetched["topics"][2]["content"], body["content"]);
}

#[tokio::test]
async fn test_content_stream_emits_sse_events() {
    let app = app(ScriptedProvider::streaming(vec![
        json!({"overview": "Borrowing"}),
        json!({"overview": "Borrowing lets you", "exercises": ["Write a fn taking &str"]}),
    ]));
    let (status, text) = send_raw(
        &app,
        request(
            Method::POST,
            "/api/generate-content/stream",
            Some(json!({"topic": "Borrowing", "curriculumTitle": "Rust"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events: Vec<_> = text
        .lines()
        .filter_map(|line| line.strip_prefix("event:"))
        .map(str::trim)
        .collect();
    assert_eq!(events, vec!["partial", "partial", "complete"]);
    assert!(text.contains("\"stored\":false"));
    assert!(text.contains("Write a fn taking &str"));
}

#[tokio::test]
async fn test_search_endpoints_shape() {
    let app = app(ScriptedProvider::text("{}"));

    let (status, web) = send(
        &app,
        Method::POST,
        "/api/tools/web-search",
        Some(json!({"query": "photosynthesis", "limit": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(web["results"].as_array().unwrap().len(), 2);
    assert_eq!(web["duration"], 250);
    assert_eq!(web["totalResults"], 3);
    assert!(web.get("sources").is_none());

    let (_, academic) = send(
        &app,
        Method::POST,
        "/api/tools/academic-search",
        Some(json!({"query": "photosynthesis"})),
    )
    .await;
    assert_eq!(academic["results"][0]["authors"], json!(["Dr. Smith", "Dr. Johnson"]));
    assert_eq!(academic["sources"], json!(["Mock Database"]));
    assert_eq!(academic["duration"], 100);
}

#[tokio::test]
async fn test_calculator_endpoint() {
    let app = app(ScriptedProvider::text("{}"));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tools/calculator",
        Some(json!({"expression": "2 + 2 * 3"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 8.0);
    assert!(!body["steps"].as_array().unwrap().is_empty());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tools/calculator",
        Some(json!({"expression": "4 / 0"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Calculation failed"));
}

#[tokio::test]
async fn test_generic_tool_execution_always_ok() {
    let app = app(ScriptedProvider::text("{}"));

    let (_, tools) = send(&app, Method::GET, "/api/tools", None).await;
    assert_eq!(tools.as_array().unwrap().len(), 3);
    assert_eq!(tools[2]["parameters"]["required"], json!(["expression"]));

    let (status, result) = send(
        &app,
        Method::POST,
        "/api/tools/calculator/execute",
        Some(json!({"expression": "10 % 4"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result, json!({"success": true, "data": 2.0, "metadata": result["metadata"]}));

    let (status, result) =
        send(&app, Method::POST, "/api/tools/teleport/execute", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["success"], false);
    assert_eq!(result["error"], "Unknown tool: teleport");
}

#[tokio::test]
async fn test_template_routes() {
    let app = app(ScriptedProvider::text("{}"));

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/templates",
        Some(json!({"name": "Story", "template": "Tell a story about {{topic}} for {{audience}}"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["variables"], json!(["topic", "audience"]));
    assert_eq!(created["isDefault"], false);
    let id = created["id"].as_str().unwrap().to_string();

    let (_, list) = send(&app, Method::GET, "/api/templates", None).await;
    assert_eq!(list[0]["id"], "explain-default");
    assert_eq!(list.as_array().unwrap().len(), 4);

    let (_, rendered) = send(
        &app,
        Method::POST,
        &format!("/api/templates/{}/render", id),
        Some(json!({"values": {"topic": "volcanoes"}})),
    )
    .await;
    assert_eq!(rendered["text"], "Tell a story about volcanoes for {{audience}}");
    assert_eq!(rendered["missing"], json!(["audience"]));

    let (_, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/templates/{}", id),
        Some(json!({"template": "Summarize {{topic}}"})),
    )
    .await;
    assert_eq!(updated["variables"], json!(["topic"]));

    let (_, extracted) = send(
        &app,
        Method::POST,
        "/api/templates/extract",
        Some(json!({"template": "{{a}} {{b}} {{a}} {{ c }}"})),
    )
    .await;
    assert_eq!(extracted["variables"], json!(["a", "b"]));

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/templates/explain-default",
        Some(json!({"name": "Mine"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, deleted) = send(&app, Method::DELETE, "/api/templates/explain-default", None).await;
    assert_eq!(deleted, json!({"deleted": false}));
    let (_, deleted) = send(&app, Method::DELETE, &format!("/api/templates/{}", id), None).await;
    assert_eq!(deleted, json!({"deleted": true}));

    let (status, _) = send(&app, Method::GET, &format!("/api/templates/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_routes_and_tool_turns() {
    let app = app(ScriptedProvider::text("{}"));

    let (status, chat) = send(&app, Method::POST, "/api/chats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat["title"], "New Chat");
    let id = chat["id"].as_str().unwrap().to_string();

    let (_, chat) = send(
        &app,
        Method::POST,
        &format!("/api/chats/{}/messages", id),
        Some(json!({"role": "user", "content": "How fast does light travel?"})),
    )
    .await;
    assert_eq!(chat["title"], "How fast does light travel?");

    let (status, message) = send(
        &app,
        Method::POST,
        &format!("/api/chats/{}/tool-calls", id),
        Some(json!({
            "turnId": "turn-light",
            "calls": [
                {"tool": "web_search", "parameters": {"query": "speed of light"}},
                {"tool": "calculator", "parameters": {"expression": "299792 * 60"}},
                {"tool": "teleport", "parameters": {}}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message["role"], "assistant");
    assert_eq!(message["turnId"], "turn-light");
    assert_ne!(message["id"], "turn-light");
    let calls = message["toolCalls"].as_array().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0]["status"], "completed");
    assert_eq!(calls[1]["result"]["data"], 17987520.0);
    assert_eq!(calls[2]["status"], "failed");

    let (status, turn) = send(&app, Method::GET, "/api/turns/turn-light", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(turn.as_array().unwrap().len(), 3);

    let (_, chat) = send(&app, Method::GET, &format!("/api/chats/{}", id), None).await;
    assert_eq!(chat["messages"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/chats/missing/tool-calls",
        Some(json!({"calls": [{"tool": "calculator", "parameters": {"expression": "1"}}]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/chats/{}/tool-calls", id),
        Some(json!({
            "turnId": "turn-light",
            "calls": [{"tool": "calculator", "parameters": {"expression": "1"}}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Turn already exists: turn-light");

    let (status, _) = send(&app, Method::GET, "/api/turns/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, deleted) = send(&app, Method::DELETE, &format!("/api/chats/{}", id), None).await;
    assert_eq!(deleted, json!({"deleted": true}));
}
