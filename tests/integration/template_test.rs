//! Template Engine and Template Store Integration Tests

use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

use superlearn::models::prompt::PromptCreateRequest;
use superlearn::services::prompt::{TemplateStore, PROMPT_TEMPLATES_KEY};
use superlearn::storage::{KeyValueStore, MemoryKvStore};
use superlearn_core::{extract_variables, fill_template, has_placeholders};

use crate::support::sqlite_store;

fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_extract_dedupes_in_first_occurrence_order() {
    let vars =
        extract_variables("Explain {{topic}} to a {{age}} year old, covering {{topic}} basics");
    assert_eq!(vars, vec!["topic", "age"]);
}

#[test]
fn test_fill_produces_the_literal_prompt() {
    let text = fill_template(
        "Explain {{topic}} to a {{age}} year old",
        &values(&[("topic", "photosynthesis"), ("age", "10")]),
    );
    assert_eq!(text, "Explain photosynthesis to a 10 year old");
    assert!(!has_placeholders(&text));
}

#[test]
fn test_partial_fill_keeps_missing_markers() {
    let text = fill_template(
        "Compare {{a}} with {{b}}",
        &values(&[("a", "rust")]),
    );
    assert_eq!(text, "Compare rust with {{b}}");
}

#[test]
fn test_builtin_delete_leaves_list_unchanged() {
    let store = TemplateStore::new(Arc::new(MemoryKvStore::new()));
    let before = store.list().unwrap();
    assert!(!store.delete("explain-default").unwrap());
    assert_eq!(store.list().unwrap(), before);
}

#[test]
fn test_user_templates_survive_restart() {
    let dir = TempDir::new().unwrap();
    let created = {
        let (kv, _db) = sqlite_store(dir.path());
        let store = TemplateStore::new(kv);
        store
            .create(PromptCreateRequest {
                name: "Quiz".to_string(),
                template: "Quiz me on {{topic}} at {{level}} level".to_string(),
                description: Some("Five questions".to_string()),
            })
            .unwrap()
    };

    let (kv, _db) = sqlite_store(dir.path());
    let store = TemplateStore::new(kv);
    let loaded = store.get(&created.id).unwrap().unwrap();
    assert_eq!(loaded.variables, vec!["topic", "level"]);
    assert!(!loaded.is_default);
    assert_eq!(store.list().unwrap().len(), 4);

    let rendered = store
        .render(&created.id, &values(&[("topic", "borrowing")]))
        .unwrap()
        .unwrap();
    assert_eq!(rendered, "Quiz me on borrowing at {{level}} level");
}

#[test]
fn test_corrupt_store_reads_as_empty() {
    let kv = Arc::new(MemoryKvStore::new());
    kv.set(PROMPT_TEMPLATES_KEY, "{not json").unwrap();
    let store = TemplateStore::new(kv);
    assert_eq!(store.list().unwrap().len(), 3);
}
