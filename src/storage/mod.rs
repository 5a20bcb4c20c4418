//! Storage Layer
//!
//! Handles all data persistence: SQLite key-value store and JSON config.

pub mod config;
pub mod database;
pub mod kv;

pub use config::*;
pub use database::*;
pub use kv::*;
