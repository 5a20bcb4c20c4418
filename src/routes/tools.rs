//! Tool routes
//!
//! Direct search and calculator endpoints plus generic execution of any
//! registered tool. Direct endpoints answer in their own response shape;
//! generic execution always answers with a `ToolResult`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Map, Value};

use superlearn_tools::{ToolDefinition, ToolResult, ACADEMIC_SEARCH, CALCULATOR, WEB_SEARCH};

use crate::models::response::{required_field, CalculatorRequest, CalculatorResponse, SearchRequest};
use crate::routes::json_body;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDefinition>> {
    Json(state.tools().definitions())
}

/// Shape a successful search result as `{results, duration, totalResults, sources?}`
fn search_body(result: ToolResult) -> Value {
    let metadata = result.metadata.unwrap_or_default();
    let results = result.data.unwrap_or_else(|| json!([]));
    let total = metadata
        .extra
        .get("totalResults")
        .cloned()
        .unwrap_or_else(|| json!(results.as_array().map_or(0, Vec::len)));

    let mut body = Map::new();
    body.insert("results".to_string(), results);
    body.insert("duration".to_string(), json!(metadata.duration.unwrap_or(0)));
    body.insert("totalResults".to_string(), total);
    if let Some(sources) = metadata.sources {
        body.insert("sources".to_string(), json!(sources));
    }
    Value::Object(body)
}

async fn search(
    state: &AppState,
    tool: &str,
    label: &str,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let req = json_body(payload)?;
    let query = required_field(req.query, "Query parameter is required")?;
    let mut args = json!({ "query": query });
    if let Some(limit) = req.limit {
        args["limit"] = json!(limit);
    }

    let result = state
        .dispatcher()
        .execute(tool, args, &state.request_token())
        .await;
    if !result.success {
        tracing::error!(tool, error = ?result.error, "search failed");
        return Err(AppError::internal(format!("Failed to perform {}", label)));
    }
    Ok(Json(search_body(result)))
}

pub async fn academic_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    search(&state, ACADEMIC_SEARCH, "academic search", payload).await
}

pub async fn web_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    search(&state, WEB_SEARCH, "web search", payload).await
}

pub async fn calculator(
    State(state): State<AppState>,
    payload: Result<Json<CalculatorRequest>, JsonRejection>,
) -> AppResult<Json<CalculatorResponse>> {
    let req = json_body(payload)?;
    let expression = required_field(req.expression, "Expression is required")?;

    let result = state
        .dispatcher()
        .execute(CALCULATOR, json!({ "expression": expression }), &state.request_token())
        .await;
    if !result.success {
        return Err(AppError::validation(
            result.error.unwrap_or_else(|| "Calculation failed".to_string()),
        ));
    }

    let value = result.data.as_ref().and_then(Value::as_f64).unwrap_or_default();
    let steps = result
        .metadata
        .and_then(|m| m.extra.get("steps").cloned())
        .and_then(|s| serde_json::from_value(s).ok())
        .unwrap_or_default();
    Ok(Json(CalculatorResponse { result: value, steps }))
}

/// Execute any registered tool. Every outcome, including unknown tools and
/// malformed bodies, is a `ToolResult` with status 200.
pub async fn execute_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Json<ToolResult> {
    let result = match payload {
        Ok(Json(args)) => {
            state
                .dispatcher()
                .execute(&name, args, &state.request_token())
                .await
        }
        Err(rejection) => ToolResult::err(rejection.body_text()),
    };
    tracing::debug!(tool = %name, success = result.success, "tool executed");
    Json(result)
}
