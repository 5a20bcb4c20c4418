//! Curriculum Models
//!
//! Curricula, their topics and the generated per-topic content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Structured learning content for one topic.
///
/// Every field may be missing while a generation is still streaming; absent
/// fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedContent {
    pub overview: String,
    pub key_concepts: Vec<String>,
    pub practical_examples: Vec<String>,
    pub important_points: Vec<String>,
    pub exercises: Vec<String>,
}

impl GeneratedContent {
    pub fn is_empty(&self) -> bool {
        self.overview.is_empty()
            && self.key_concepts.is_empty()
            && self.practical_examples.is_empty()
            && self.important_points.is_empty()
            && self.exercises.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<GeneratedContent>,
}

impl Topic {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            content: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curriculum {
    pub id: String,
    pub title: String,
    pub topics: Vec<Topic>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shape returned by curriculum generation, before it is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumDraft {
    pub title: String,
    pub topics: Vec<Topic>,
}

impl CurriculumDraft {
    /// Make topic ids unique.
    ///
    /// A topic whose id is empty or already taken gets `topic-{index}`
    /// (suffixed further if that is taken too). Order is preserved.
    pub fn dedupe_topic_ids(&mut self) {
        let mut seen = HashSet::new();
        for (index, topic) in self.topics.iter_mut().enumerate() {
            if topic.id.trim().is_empty() || seen.contains(&topic.id) {
                let mut candidate = format!("topic-{}", index);
                let mut suffix = 1;
                while seen.contains(&candidate) {
                    candidate = format!("topic-{}-{}", index, suffix);
                    suffix += 1;
                }
                tracing::debug!(from = %topic.id, to = %candidate, "reassigned duplicate topic id");
                topic.id = candidate;
            }
            seen.insert(topic.id.clone());
        }
    }
}

/// Partial update of a stored curriculum
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurriculumPatch {
    pub title: Option<String>,
    pub topics: Option<Vec<Topic>>,
}

/// Generated content persisted for one (curriculum, topic) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredContent {
    pub id: String,
    pub curriculum_id: String,
    pub topic_id: String,
    pub content: GeneratedContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
