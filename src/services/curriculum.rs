//! Curriculum Service
//!
//! Curricula and generated content, each kept as one JSON collection in the
//! key-value store. Writers of this service are serialized; deleting a
//! curriculum and its content are still two independent writes.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::curriculum::{
    Curriculum, CurriculumDraft, CurriculumPatch, GeneratedContent, StoredContent,
};
use crate::storage::kv::{load_json, save_json, KeyValueStore, WriteLock};
use crate::utils::error::AppResult;

pub const CURRICULA_KEY: &str = "curricula";
pub const CONTENT_KEY: &str = "content";

pub struct CurriculumStore {
    store: Arc<dyn KeyValueStore>,
    writes: WriteLock,
}

impl CurriculumStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            writes: WriteLock::new(),
        }
    }

    pub fn get_all(&self) -> AppResult<Vec<Curriculum>> {
        load_json(self.store.as_ref(), CURRICULA_KEY)
    }

    pub fn get_by_id(&self, id: &str) -> AppResult<Option<Curriculum>> {
        Ok(self.get_all()?.into_iter().find(|c| c.id == id))
    }

    /// Persist a new curriculum, assigning id and timestamps
    pub fn save(&self, mut draft: CurriculumDraft) -> AppResult<Curriculum> {
        let _guard = self.writes.acquire()?;
        draft.dedupe_topic_ids();
        let now = Utc::now();
        let curriculum = Curriculum {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            topics: draft.topics,
            created_at: now,
            updated_at: now,
        };

        let mut all = self.get_all()?;
        all.push(curriculum.clone());
        save_json(self.store.as_ref(), CURRICULA_KEY, &all)?;
        tracing::info!(id = %curriculum.id, topics = curriculum.topics.len(), "curriculum saved");
        Ok(curriculum)
    }

    pub fn update(&self, id: &str, patch: CurriculumPatch) -> AppResult<Option<Curriculum>> {
        let _guard = self.writes.acquire()?;
        let mut all = self.get_all()?;
        let Some(curriculum) = all.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            curriculum.title = title;
        }
        if let Some(topics) = patch.topics {
            let mut draft = CurriculumDraft {
                title: String::new(),
                topics,
            };
            draft.dedupe_topic_ids();
            curriculum.topics = draft.topics;
        }
        curriculum.updated_at = Utc::now();
        let updated = curriculum.clone();
        save_json(self.store.as_ref(), CURRICULA_KEY, &all)?;
        Ok(Some(updated))
    }

    /// Delete a curriculum and its stored content
    pub fn delete(&self, id: &str) -> AppResult<bool> {
        let _guard = self.writes.acquire()?;
        let mut all = self.get_all()?;
        let before = all.len();
        all.retain(|c| c.id != id);
        if all.len() == before {
            return Ok(false);
        }
        save_json(self.store.as_ref(), CURRICULA_KEY, &all)?;

        let mut content = self.all_content()?;
        content.retain(|c| c.curriculum_id != id);
        save_json(self.store.as_ref(), CONTENT_KEY, &content)?;
        tracing::info!(id, "curriculum deleted");
        Ok(true)
    }

    pub fn all_content(&self) -> AppResult<Vec<StoredContent>> {
        load_json(self.store.as_ref(), CONTENT_KEY)
    }

    pub fn get_content(&self, curriculum_id: &str, topic_id: &str) -> AppResult<Option<StoredContent>> {
        Ok(self
            .all_content()?
            .into_iter()
            .find(|c| c.curriculum_id == curriculum_id && c.topic_id == topic_id))
    }

    /// Upsert content for the (curriculum, topic) pair
    pub fn save_content(
        &self,
        curriculum_id: &str,
        topic_id: &str,
        content: GeneratedContent,
    ) -> AppResult<StoredContent> {
        let _guard = self.writes.acquire()?;
        let mut all = self.all_content()?;
        let now = Utc::now();
        let stored = match all
            .iter_mut()
            .find(|c| c.curriculum_id == curriculum_id && c.topic_id == topic_id)
        {
            Some(existing) => {
                existing.content = content;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let fresh = StoredContent {
                    id: Uuid::new_v4().to_string(),
                    curriculum_id: curriculum_id.to_string(),
                    topic_id: topic_id.to_string(),
                    content,
                    created_at: now,
                    updated_at: now,
                };
                all.push(fresh.clone());
                fresh
            }
        };
        save_json(self.store.as_ref(), CONTENT_KEY, &all)?;
        tracing::debug!(curriculum_id, topic_id, "content saved");
        Ok(stored)
    }

    pub fn update_content(&self, id: &str, content: GeneratedContent) -> AppResult<Option<StoredContent>> {
        let _guard = self.writes.acquire()?;
        let mut all = self.all_content()?;
        let Some(existing) = all.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        existing.content = content;
        existing.updated_at = Utc::now();
        let updated = existing.clone();
        save_json(self.store.as_ref(), CONTENT_KEY, &all)?;
        Ok(Some(updated))
    }

    pub fn delete_content(&self, id: &str) -> AppResult<bool> {
        let _guard = self.writes.acquire()?;
        let mut all = self.all_content()?;
        let before = all.len();
        all.retain(|c| c.id != id);
        if all.len() == before {
            return Ok(false);
        }
        save_json(self.store.as_ref(), CONTENT_KEY, &all)?;
        Ok(true)
    }

    /// Fill each topic's `content` from storage
    pub fn hydrate(&self, mut curriculum: Curriculum) -> AppResult<Curriculum> {
        let content = self.all_content()?;
        for topic in &mut curriculum.topics {
            if let Some(stored) = content
                .iter()
                .find(|c| c.curriculum_id == curriculum.id && c.topic_id == topic.id)
            {
                topic.content = Some(stored.content.clone());
            }
        }
        Ok(curriculum)
    }
}
