//! Prompt template routes

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use superlearn_core::{extract_variables as extract, fill_template, missing_variables};

use crate::models::prompt::{PromptCreateRequest, PromptTemplate, PromptUpdateRequest};
use crate::models::response::{
    DeletedResponse, ExtractVariablesRequest, ExtractVariablesResponse, RenderTemplateRequest,
    RenderTemplateResponse,
};
use crate::routes::json_body;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

fn not_found(id: &str) -> AppError {
    AppError::not_found(format!("Template not found: {}", id))
}

pub async fn list_templates(State(state): State<AppState>) -> AppResult<Json<Vec<PromptTemplate>>> {
    Ok(Json(state.templates().list()?))
}

pub async fn create_template(
    State(state): State<AppState>,
    payload: Result<Json<PromptCreateRequest>, JsonRejection>,
) -> AppResult<Json<PromptTemplate>> {
    let template = state.templates().create(json_body(payload)?)?;
    Ok(Json(template))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PromptTemplate>> {
    state
        .templates()
        .get(&id)?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PromptUpdateRequest>, JsonRejection>,
) -> AppResult<Json<PromptTemplate>> {
    state
        .templates()
        .update(&id, json_body(payload)?)?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeletedResponse>> {
    let deleted = state.templates().delete(&id)?;
    Ok(Json(DeletedResponse { deleted }))
}

pub async fn render_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RenderTemplateRequest>, JsonRejection>,
) -> AppResult<Json<RenderTemplateResponse>> {
    let req = json_body(payload)?;
    let template = state.templates().get(&id)?.ok_or_else(|| not_found(&id))?;
    Ok(Json(RenderTemplateResponse {
        text: fill_template(&template.template, &req.values),
        missing: missing_variables(&template.template, &req.values),
    }))
}

pub async fn extract_variables(
    payload: Result<Json<ExtractVariablesRequest>, JsonRejection>,
) -> AppResult<Json<ExtractVariablesResponse>> {
    let req = json_body(payload)?;
    Ok(Json(ExtractVariablesResponse {
        variables: extract(&req.template),
    }))
}
