//! Chat routes
//!
//! Chats, their messages, and tool turns run on behalf of a chat.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use superlearn_tools::ToolCall;

use crate::models::chat::{Chat, ChatMessage};
use crate::models::response::{AddMessageRequest, CreateChatRequest, DeletedResponse, ToolTurnRequest};
use crate::routes::json_body;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

fn not_found(id: &str) -> AppError {
    AppError::not_found(format!("Chat not found: {}", id))
}

pub async fn list_chats(State(state): State<AppState>) -> AppResult<Json<Vec<Chat>>> {
    Ok(Json(state.chats().list()?))
}

/// Create a chat. An absent body creates an untitled chat.
pub async fn create_chat(
    State(state): State<AppState>,
    payload: Option<Json<CreateChatRequest>>,
) -> AppResult<Json<Chat>> {
    let title = payload
        .and_then(|Json(req)| req.title)
        .filter(|t| !t.trim().is_empty());
    Ok(Json(state.chats().create(title)?))
}

pub async fn get_chat(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Chat>> {
    state.chats().get(&id)?.map(Json).ok_or_else(|| not_found(&id))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeletedResponse>> {
    let deleted = state.chats().delete(&id)?;
    Ok(Json(DeletedResponse { deleted }))
}

pub async fn add_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AddMessageRequest>, JsonRejection>,
) -> AppResult<Json<Chat>> {
    let req = json_body(payload)?;
    state
        .chats()
        .add_message(&id, ChatMessage::new(req.role, req.content))?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

/// Run a batch of tool calls and answer with the assistant message that
/// records them
pub async fn run_tool_calls(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ToolTurnRequest>, JsonRejection>,
) -> AppResult<Json<ChatMessage>> {
    let req = json_body(payload)?;
    state
        .chats()
        .run_tool_turn(&id, req.calls, req.turn_id, state.request_token())
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

/// Current state of every call in a turn
pub async fn get_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<ToolCall>>> {
    state
        .chats()
        .turn_snapshot(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Turn not found: {}", id)))
}
