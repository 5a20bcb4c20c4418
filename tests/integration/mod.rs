//! Integration Tests Module
//!
//! Exercises the SuperLearn crate through its public API and through the
//! axum router: templates, curriculum generation and storage, tool calling,
//! and the HTTP surface.

// Shared test doubles and state builders
mod support;

// Template engine and template store tests
mod template_test;

// Curriculum and content generation tests
mod curriculum_test;

// Tool registry, lifecycle tracking and chat tool turns
mod tool_calling_test;

// HTTP routes via tower oneshot
mod api_test;
