//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SITEALIAS_*)
//! 2. TOML config file (if SITEALIAS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::AgentRole;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SITEALIAS_*)
/// 2. TOML config file (if SITEALIAS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the agent platform project endpoint.
    ///
    /// Set via SITEALIAS_ENDPOINT environment variable.
    /// Required only by the agent-backed workflows.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer credential for the agent platform.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API version query parameter sent with every platform request.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Project name recorded on agents this process creates.
    #[serde(default = "default_project")]
    pub project: String,

    /// Stable identifier of the resolver agent.
    #[serde(default)]
    pub resolver_agent_id: Option<String>,

    /// Stable identifier of the validator agent.
    #[serde(default)]
    pub validator_agent_id: Option<String>,

    /// Stable identifier of the keyword-extractor agent.
    #[serde(default)]
    pub keyword_agent_id: Option<String>,

    /// Stable identifier of the open-phrase generator agent.
    #[serde(default)]
    pub phrase_agent_id: Option<String>,

    /// Model deployment name used when an agent has to be created.
    #[serde(default = "default_model")]
    pub model: String,

    /// Connection id of the web-search grounding tool.
    #[serde(default)]
    pub search_connection_id: Option<String>,

    /// Connection id of the HTTP-fetch connector used by the validator.
    #[serde(default)]
    pub fetch_connection_id: Option<String>,

    /// Directory holding domains/urls/phrases artifacts.
    ///
    /// Set via SITEALIAS_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Whether the cache is written gzip-compressed.
    #[serde(default)]
    pub compressed: bool,

    /// Interval between run status polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wall-clock budget for a single run in milliseconds.
    #[serde(default = "default_run_timeout_ms")]
    pub run_timeout_ms: u64,

    /// Maximum number of validation attempts per call.
    #[serde(default = "default_max_validation_attempts")]
    pub max_validation_attempts: u32,

    /// Number of top search results the phrase generator covers.
    #[serde(default = "default_discovery_top_n")]
    pub discovery_top_n: u32,

    /// User-Agent string for platform requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_version() -> String {
    "v1".into()
}

fn default_project() -> String {
    "sitealias".into()
}

fn default_model() -> String {
    "gpt-4o".into()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./.sitealias-cache")
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_run_timeout_ms() -> u64 {
    30_000
}

fn default_max_validation_attempts() -> u32 {
    5
}

fn default_discovery_top_n() -> u32 {
    10
}

fn default_user_agent() -> String {
    "sitealias/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: default_api_version(),
            project: default_project(),
            resolver_agent_id: None,
            validator_agent_id: None,
            keyword_agent_id: None,
            phrase_agent_id: None,
            model: default_model(),
            search_connection_id: None,
            fetch_connection_id: None,
            cache_dir: default_cache_dir(),
            compressed: false,
            poll_interval_ms: default_poll_interval_ms(),
            run_timeout_ms: default_run_timeout_ms(),
            max_validation_attempts: default_max_validation_attempts(),
            discovery_top_n: default_discovery_top_n(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Poll interval as Duration for use with tokio.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Run budget as Duration for use with tokio.
    pub fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed or
    /// validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SITEALIAS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("SITEALIAS_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Platform endpoint, required once an agent workflow is invoked.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the endpoint is not set.
    pub fn require_endpoint(&self) -> Result<&str, ConfigError> {
        self.endpoint.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "endpoint".into(),
            hint: "Set SITEALIAS_ENDPOINT environment variable".into(),
        })
    }

    /// Configured agent identifier for a role, if any.
    pub fn agent_id(&self, role: AgentRole) -> Option<&str> {
        let id = match role {
            AgentRole::Resolver => &self.resolver_agent_id,
            AgentRole::Validator => &self.validator_agent_id,
            AgentRole::KeywordExtractor => &self.keyword_agent_id,
            AgentRole::PhraseGenerator => &self.phrase_agent_id,
        };
        id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Agent identifier for a role, required by the workflow using it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no identifier is configured for `role`.
    pub fn require_agent_id(&self, role: AgentRole) -> Result<&str, ConfigError> {
        self.agent_id(role).ok_or_else(|| {
            let field = match role {
                AgentRole::Resolver => "resolver_agent_id",
                AgentRole::Validator => "validator_agent_id",
                AgentRole::KeywordExtractor => "keyword_agent_id",
                AgentRole::PhraseGenerator => "phrase_agent_id",
            };
            ConfigError::Missing {
                field: field.into(),
                hint: format!("Set SITEALIAS_{} environment variable", field.to_uppercase()),
            }
        })
    }
}
