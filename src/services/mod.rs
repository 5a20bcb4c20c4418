//! Services
//!
//! Business logic services for the application.
//! Services handle the core functionality and are called by the HTTP routes.

pub mod chat;
pub mod curriculum;
pub mod generation;
pub mod prompt;

pub use chat::ChatService;
pub use curriculum::CurriculumStore;
pub use generation::{ContentStreamEvent, ContentTarget, GenerationOrchestrator};
pub use prompt::TemplateStore;
