//! Prompt Template Models
//!
//! Data structures for the prompt library feature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use superlearn_core::extract_variables;

/// A prompt template in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,
    pub name: String,
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Extracted {{variable}} names, in first-occurrence order
    #[serde(default)]
    pub variables: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Built-in templates cannot be edited or deleted
    #[serde(default)]
    pub is_default: bool,
}

impl PromptTemplate {
    /// New user template; `variables` is derived from `template`
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        template: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let template = template.into();
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            variables: extract_variables(&template),
            template,
            description,
            created_at: now,
            updated_at: now,
            is_default: false,
        }
    }

    /// Replace the template text and recompute `variables`
    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
        self.refresh_variables();
    }

    /// Recompute `variables` from `template`
    pub fn refresh_variables(&mut self) {
        self.variables = extract_variables(&self.template);
    }
}

/// Request to create a new prompt template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptCreateRequest {
    pub name: String,
    pub template: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to update an existing prompt template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptUpdateRequest {
    pub name: Option<String>,
    pub template: Option<String>,
    pub description: Option<String>,
}
