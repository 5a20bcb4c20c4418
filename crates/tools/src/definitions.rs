//! Default tool set
//!
//! Builds the process-wide registry from search settings.

use std::sync::Arc;
use std::time::Duration;

use crate::academic_search::{academic_backend, AcademicSearchTool};
use crate::calculator::CalculatorTool;
use crate::trait_def::ToolRegistry;
use crate::web_search::{web_backend, WebSearchTool};

/// Search provider selection and credentials
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// "mock", "tavily" or "brave"
    pub web_provider: String,
    pub web_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,
    /// Timeout of the backend HTTP client
    pub request_timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            web_provider: "mock".to_string(),
            web_api_key: None,
            perplexity_api_key: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Registry with `academic_search`, `web_search` and `calculator`, in that order.
pub fn default_registry(settings: &SearchSettings) -> ToolRegistry {
    let client = reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to build search HTTP client, using defaults");
            reqwest::Client::new()
        });

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(AcademicSearchTool::new(academic_backend(
        client.clone(),
        settings.perplexity_api_key.as_deref(),
    ))));
    registry.register(Arc::new(WebSearchTool::new(web_backend(
        client,
        &settings.web_provider,
        settings.web_api_key.as_deref(),
    ))));
    registry.register(Arc::new(CalculatorTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{SearchParams, ToolParameters};
    use crate::trait_def::ToolExecutionContext;

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry(&SearchSettings::default());
        assert_eq!(
            registry.names(),
            vec!["academic_search", "web_search", "calculator"]
        );
        for def in registry.definitions() {
            assert_eq!(def.parameters["type"], "object");
            assert!(!def.description.is_empty());
        }
    }

    #[tokio::test]
    async fn test_academic_search_without_credentials_is_mock() {
        let registry = default_registry(&SearchSettings::default());
        let params = ToolParameters::AcademicSearch(SearchParams::new("black holes"));
        let result = registry.execute(&ToolExecutionContext::new(), &params).await;
        assert!(result.success);
        assert_eq!(result.data.unwrap().as_array().unwrap().len(), 1);
    }
}
