//! Settings Models
//!
//! Application configuration and settings data structures.

use serde::{Deserialize, Serialize};

use superlearn_llm::{ProviderConfig, ProviderType};
use superlearn_tools::SearchSettings;

/// Accepted values of `search_provider`
pub const SEARCH_PROVIDERS: [&str; 3] = ["mock", "tavily", "brave"];

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub host: String,
    pub port: u16,
    /// LLM provider: "openai" or "ollama"
    pub llm_provider: String,
    pub llm_model: String,
    /// Custom chat-completions endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Web search provider: "mock", "tavily", or "brave"
    pub search_provider: String,
    /// Per tool call budget in seconds
    pub tool_timeout_secs: u64,
    /// Timeout of outbound HTTP requests in seconds
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            llm_provider: "openai".to_string(),
            llm_model: "gpt-4o".to_string(),
            llm_base_url: None,
            max_tokens: 4096,
            temperature: 0.7,
            search_provider: "mock".to_string(),
            tool_timeout_secs: 30,
            request_timeout_secs: 60,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub search_provider: Option<String>,
    pub tool_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(host) = update.host {
            self.host = host;
        }
        if let Some(port) = update.port {
            self.port = port;
        }
        if let Some(provider) = update.llm_provider {
            self.llm_provider = provider;
        }
        if let Some(model) = update.llm_model {
            self.llm_model = model;
        }
        if let Some(base_url) = update.llm_base_url {
            self.llm_base_url = Some(base_url).filter(|u| !u.trim().is_empty());
        }
        if let Some(max_tokens) = update.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(search_provider) = update.search_provider {
            self.search_provider = search_provider;
        }
        if let Some(secs) = update.tool_timeout_secs {
            self.tool_timeout_secs = secs;
        }
        if let Some(secs) = update.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        self.llm_provider
            .parse::<ProviderType>()
            .map_err(|e| e.to_string())?;

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "Invalid temperature: {}. Must be between 0 and 2",
                self.temperature
            ));
        }

        if !SEARCH_PROVIDERS.contains(&self.search_provider.as_str()) {
            return Err(format!(
                "Invalid search provider: {}. Must be 'mock', 'tavily', or 'brave'",
                self.search_provider
            ));
        }

        if self.tool_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err("timeouts must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// LLM provider configuration with the given API key
    pub fn provider_config(&self, api_key: Option<String>) -> Result<ProviderConfig, String> {
        let provider = self
            .llm_provider
            .parse::<ProviderType>()
            .map_err(|e| e.to_string())?;
        Ok(ProviderConfig {
            provider,
            api_key,
            base_url: self.llm_base_url.clone(),
            model: self.llm_model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout_secs: self.request_timeout_secs,
        })
    }

    /// Search backend selection with the given secrets
    pub fn search_settings(&self, secrets: &Secrets) -> SearchSettings {
        let web_api_key = match self.search_provider.as_str() {
            "tavily" => secrets.tavily_api_key.clone(),
            "brave" => secrets.brave_api_key.clone(),
            _ => None,
        };
        SearchSettings {
            web_provider: self.search_provider.clone(),
            web_api_key,
            perplexity_api_key: secrets.perplexity_api_key.clone(),
            request_timeout: std::time::Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// API keys, read from the environment and never persisted
#[derive(Clone, Default)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub brave_api_key: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: var("OPENAI_API_KEY"),
            perplexity_api_key: var("PERPLEXITY_API_KEY"),
            tavily_api_key: var("TAVILY_API_KEY"),
            brave_api_key: var("BRAVE_API_KEY"),
        }
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("perplexity_api_key", &mask(&self.perplexity_api_key))
            .field("tavily_api_key", &mask(&self.tavily_api_key))
            .field("brave_api_key", &mask(&self.brave_api_key))
            .finish()
    }
}
