//! Curriculum routes

use axum::extract::{Path, State};
use axum::Json;

use crate::models::curriculum::Curriculum;
use crate::models::response::DeletedResponse;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

pub async fn list_curricula(State(state): State<AppState>) -> AppResult<Json<Vec<Curriculum>>> {
    Ok(Json(state.curricula().get_all()?))
}

/// One curriculum with each topic's stored content filled in
pub async fn get_curriculum(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Curriculum>> {
    let curricula = state.curricula();
    let curriculum = curricula
        .get_by_id(&id)?
        .ok_or_else(|| AppError::not_found(format!("Curriculum not found: {}", id)))?;
    Ok(Json(curricula.hydrate(curriculum)?))
}

pub async fn delete_curriculum(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeletedResponse>> {
    let deleted = state.curricula().delete(&id)?;
    Ok(Json(DeletedResponse { deleted }))
}
