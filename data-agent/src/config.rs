//! Configuration for data-agent
//!
//! Defaults are layered under an optional TOML file and `DATA_AGENT_*`
//! environment variables (`DATA_AGENT_API__BASE_URL`, `DATA_AGENT_FEATURES__CHAT_ENABLED`, ...).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AgentError, Result};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "DATA_AGENT";

/// Main agent configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    pub api: ApiConfig,
    pub features: FeatureFlags,
    pub search: SearchConfig,
    pub insights: InsightsConfig,
    pub data: DataConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Backend endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// REST base URL, without the `/api/v1` prefix
    pub base_url: String,
    /// WebSocket URL for the optional push channel
    pub ws_url: String,
    /// Request timeout in seconds (None = HTTP client default)
    pub request_timeout_secs: Option<u64>,
}

/// Feature flags
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub chat_enabled: bool,
    pub export_enabled: bool,
    pub debug_mode: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before suggestions or real-time search fire
    pub debounce_ms: u64,
    /// Maximum recent/saved searches kept in local storage
    pub history_limit: usize,
    /// Page size sent with each search request
    pub result_limit: usize,
    /// Number of suggestions requested per source
    pub suggestion_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InsightsConfig {
    pub refresh_interval_secs: u64,
    /// Results from the active search used to scope insights
    pub scope_limit: usize,
    /// Results handed to the chat completion as context
    pub chat_context_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Local key-value file (None = in-memory only)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            ws_url: "ws://localhost:8000/ws".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            chat_enabled: true,
            export_enabled: true,
            debug_mode: false,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            history_limit: 10,
            result_limit: 50,
            suggestion_limit: 5,
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
            scope_limit: 20,
            chat_context_limit: 5,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(".data-agent/storage.json")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AgentConfig {
    /// Load defaults, then `path` (if it exists), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_sources(path, None)
    }

    /// Same as [`AgentConfig::load`], with an explicit environment map instead of the process env.
    pub fn from_sources(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AgentConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config: AgentConfig = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AgentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Presence checks only; URLs are not contacted.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AgentError::Config("api.base_url must be set".to_string()));
        }
        if self.api.ws_url.trim().is_empty() {
            return Err(AgentError::Config("api.ws_url must be set".to_string()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.insights.refresh_interval_secs)
    }

    /// Effective log filter; debug mode wins over the configured level.
    pub fn log_level(&self) -> &str {
        if self.features.debug_mode {
            "debug"
        } else {
            &self.logging.level
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.search.debounce_ms, 300);
        assert_eq!(config.search.history_limit, 10);
        assert_eq!(config.insights.scope_limit, 20);
        assert_eq!(config.insights.chat_context_limit, 5);
        assert!(config.features.chat_enabled);
        assert!(config.api.request_timeout_secs.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AgentConfig::from_toml_str(
            r#"
            [api]
            base_url = "https://agent.example.com"

            [features]
            export_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://agent.example.com");
        assert_eq!(config.api.ws_url, "ws://localhost:8000/ws");
        assert!(!config.features.export_enabled);
        assert!(config.features.chat_enabled);
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            (
                "DATA_AGENT_API__BASE_URL".to_string(),
                "http://backend:9000".to_string(),
            ),
            (
                "DATA_AGENT_FEATURES__CHAT_ENABLED".to_string(),
                "false".to_string(),
            ),
            (
                "DATA_AGENT_FEATURES__DEBUG_MODE".to_string(),
                "true".to_string(),
            ),
        ]);

        let config = AgentConfig::from_sources(None, Some(env)).unwrap();
        assert_eq!(config.api.base_url, "http://backend:9000");
        assert!(!config.features.chat_enabled);
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn test_blank_base_url_rejected() {
        let result = AgentConfig::from_toml_str(
            r#"
            [api]
            base_url = "  "
            "#,
        );
        assert!(matches!(result, Err(AgentError::Config(_))));
    }
}
