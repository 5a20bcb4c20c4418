//! SuperLearn - Rust Backend Library
//!
//! Backend of the SuperLearn learning assistant. It includes:
//! - axum routes for the HTTP API
//! - Business logic services (templates, curricula, content generation, chats)
//! - Storage layer (SQLite key-value store, config file)
//! - Data models and utilities

pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::settings::{AppConfig, Secrets, SettingsUpdate};
pub use routes::router;
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
