//! Data Models
//!
//! Contains all data structures used throughout the application.

pub mod chat;
pub mod curriculum;
pub mod prompt;
pub mod response;
pub mod settings;

pub use chat::*;
pub use curriculum::*;
pub use prompt::*;
pub use response::*;
pub use settings::*;
