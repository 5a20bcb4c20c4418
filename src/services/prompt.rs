//! Prompt Service
//!
//! Business logic for managing prompt templates. Built-in templates live in
//! memory and are never written; user templates are one JSON document in the
//! key-value store.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use superlearn_core::fill_template;

use crate::models::prompt::{PromptCreateRequest, PromptTemplate, PromptUpdateRequest};
use crate::storage::kv::{load_json, save_json, KeyValueStore, WriteLock};
use crate::utils::error::{AppError, AppResult};

/// Storage key of user templates
pub const PROMPT_TEMPLATES_KEY: &str = "superlearn_prompt_templates";

/// Built-in templates in registration order: (id, name, template, description)
const BUILTIN_TEMPLATES: [(&str, &str, &str, &str); 3] = [
    (
        "explain-default",
        "Simple Explanation",
        "Explain {{topic}} in simple terms",
        "Get a straightforward explanation of any topic",
    ),
    (
        "explain-like-5",
        "Explain Like I'm 5",
        "Explain {{topic}} like I'm 5 years old",
        "Get explanations suitable for young children",
    ),
    (
        "explain-analogy",
        "Explain with Analogies",
        "Explain {{topic}} using simple analogies and everyday examples",
        "Understand complex topics through relatable comparisons",
    ),
];

/// Built-in plus user prompt templates
pub struct TemplateStore {
    store: Arc<dyn KeyValueStore>,
    builtins: Vec<PromptTemplate>,
    writes: WriteLock,
}

impl TemplateStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let builtins = BUILTIN_TEMPLATES
            .iter()
            .map(|(id, name, template, description)| {
                let mut t =
                    PromptTemplate::new(*id, *name, *template, Some(description.to_string()));
                t.is_default = true;
                t
            })
            .collect();
        Self {
            store,
            builtins,
            writes: WriteLock::new(),
        }
    }

    pub fn is_builtin(&self, id: &str) -> bool {
        self.builtins.iter().any(|t| t.id == id)
    }

    fn load_user(&self) -> AppResult<Vec<PromptTemplate>> {
        let mut templates: Vec<PromptTemplate> = load_json(self.store.as_ref(), PROMPT_TEMPLATES_KEY)?;
        templates.retain(|t| !self.is_builtin(&t.id));
        for template in &mut templates {
            template.is_default = false;
            template.refresh_variables();
        }
        Ok(templates)
    }

    fn save_user(&self, templates: &[PromptTemplate]) -> AppResult<()> {
        save_json(self.store.as_ref(), PROMPT_TEMPLATES_KEY, templates)
    }

    /// Built-ins first, then user templates in creation order
    pub fn list(&self) -> AppResult<Vec<PromptTemplate>> {
        let mut all = self.builtins.clone();
        all.extend(self.load_user()?);
        Ok(all)
    }

    pub fn get(&self, id: &str) -> AppResult<Option<PromptTemplate>> {
        if let Some(builtin) = self.builtins.iter().find(|t| t.id == id) {
            return Ok(Some(builtin.clone()));
        }
        Ok(self.load_user()?.into_iter().find(|t| t.id == id))
    }

    /// Upsert a user template by id.
    ///
    /// `variables` is recomputed from `template`; built-in ids are rejected.
    pub fn save(&self, template: PromptTemplate) -> AppResult<PromptTemplate> {
        if self.is_builtin(&template.id) {
            return Err(AppError::validation(format!(
                "Built-in template cannot be modified: {}",
                template.id
            )));
        }
        if template.id.trim().is_empty() {
            return Err(AppError::validation("Template id is required"));
        }
        let _guard = self.writes.acquire()?;
        self.upsert(template)
    }

    /// Caller holds the write lock
    fn upsert(&self, mut template: PromptTemplate) -> AppResult<PromptTemplate> {
        template.is_default = false;
        template.refresh_variables();

        let mut templates = self.load_user()?;
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => templates.push(template.clone()),
        }
        self.save_user(&templates)?;
        tracing::debug!(id = %template.id, "saved prompt template");
        Ok(template)
    }

    /// Create a user template with a fresh id
    pub fn create(&self, req: PromptCreateRequest) -> AppResult<PromptTemplate> {
        if req.name.trim().is_empty() {
            return Err(AppError::validation("Template name is required"));
        }
        if req.template.trim().is_empty() {
            return Err(AppError::validation("Template text is required"));
        }
        let template = PromptTemplate::new(
            Uuid::new_v4().to_string(),
            req.name,
            req.template,
            req.description,
        );
        self.save(template)
    }

    /// Update a user template. Returns `None` for unknown ids.
    pub fn update(&self, id: &str, req: PromptUpdateRequest) -> AppResult<Option<PromptTemplate>> {
        if self.is_builtin(id) {
            return Err(AppError::validation(format!(
                "Built-in template cannot be modified: {}",
                id
            )));
        }
        let _guard = self.writes.acquire()?;
        let Some(mut template) = self.load_user()?.into_iter().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(name) = req.name {
            template.name = name;
        }
        if let Some(text) = req.template {
            template.set_template(text);
        }
        if let Some(description) = req.description {
            template.description = Some(description).filter(|d| !d.is_empty());
        }
        template.updated_at = Utc::now();
        self.upsert(template).map(Some)
    }

    /// Delete a user template. Built-in and unknown ids are a no-op returning false.
    pub fn delete(&self, id: &str) -> AppResult<bool> {
        if self.is_builtin(id) {
            tracing::debug!(id, "refusing to delete built-in template");
            return Ok(false);
        }
        let _guard = self.writes.acquire()?;
        let mut templates = self.load_user()?;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Ok(false);
        }
        self.save_user(&templates)?;
        Ok(true)
    }

    /// Fill the template `id` with `values`
    pub fn render(&self, id: &str, values: &HashMap<String, String>) -> AppResult<Option<String>> {
        Ok(self.get(id)?.map(|t| fill_template(&t.template, values)))
    }
}
