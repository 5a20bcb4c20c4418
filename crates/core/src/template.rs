//! Template Engine
//!
//! Placeholder scanning and substitution for prompt templates.
//!
//! A placeholder is `{{identifier}}` where `identifier` matches `[A-Za-z0-9_]+`.
//! Anything else that merely looks like a marker (`{{ topic }}`, `{{topic}`,
//! `{{}}`) is literal text.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Compiled placeholder pattern (initialized once).
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder pattern is a valid regex")
    })
}

/// Extract the distinct placeholder names from `template`, in order of first
/// appearance.
pub fn extract_variables(template: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(template) {
        let name = &caps[1];
        if !variables.iter().any(|v| v == name) {
            variables.push(name.to_string());
        }
    }
    variables
}

/// Replace every placeholder with its value.
///
/// Placeholders without an entry in `values` are left verbatim so that a
/// partially filled template can still be previewed.
pub fn fill_template(template: &str, values: &HashMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder names in `template` that have no entry in `values`.
pub fn missing_variables(template: &str, values: &HashMap<String, String>) -> Vec<String> {
    extract_variables(template)
        .into_iter()
        .filter(|name| !values.contains_key(name))
        .collect()
}

/// Whether `text` still contains at least one well-formed placeholder.
pub fn has_placeholders(text: &str) -> bool {
    placeholder_regex().is_match(text)
}
