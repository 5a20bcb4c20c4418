//! HTTP Routes
//!
//! The axum router and its handlers, grouped by resource. Handlers are thin:
//! they validate the request, call one service and shape the response.

pub mod chats;
pub mod curricula;
pub mod generate;
pub mod health;
pub mod templates;
pub mod tools;

use axum::extract::rejection::JsonRejection;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        // Generation
        .route("/api/generate-curriculum", post(generate::generate_curriculum))
        .route("/api/generate-content", post(generate::generate_content))
        .route("/api/generate-content/stream", post(generate::stream_content))
        // Curricula
        .route("/api/curricula", get(curricula::list_curricula))
        .route(
            "/api/curricula/:id",
            get(curricula::get_curriculum).delete(curricula::delete_curriculum),
        )
        // Tools
        .route("/api/tools", get(tools::list_tools))
        .route("/api/tools/academic-search", post(tools::academic_search))
        .route("/api/tools/web-search", post(tools::web_search))
        .route("/api/tools/calculator", post(tools::calculator))
        .route("/api/tools/:name/execute", post(tools::execute_tool))
        // Templates
        .route(
            "/api/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route("/api/templates/extract", post(templates::extract_variables))
        .route(
            "/api/templates/:id",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .route("/api/templates/:id/render", post(templates::render_template))
        // Chats
        .route("/api/chats", get(chats::list_chats).post(chats::create_chat))
        .route(
            "/api/chats/:id",
            get(chats::get_chat).delete(chats::delete_chat),
        )
        .route("/api/chats/:id/messages", post(chats::add_message))
        .route("/api/chats/:id/tool-calls", post(chats::run_tool_calls))
        .route("/api/turns/:id", get(chats::get_turn))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Unwrap a JSON body, reporting extractor rejections as `{error}` responses
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}
