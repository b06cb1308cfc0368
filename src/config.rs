//! Framework configuration
//!
//! Process-wide settings for the pipeline engine, read once and treated as
//! read-only at runtime: log level, retry defaults, backoff strategy, and
//! the LLM completion transport. Loadable from a TOML file with serde
//! defaults for every field, so an empty file is a valid configuration.
//!
//! Credentials are referenced by environment variable name and resolved at
//! use time, never stored in the configuration itself.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level framework configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameworkConfig {
    /// Log level for engine records
    #[serde(default)]
    pub log_level: LogLevel,

    /// Retry ceiling used when a Retry outcome declares no max_attempts
    #[serde(default = "default_retry_attempts")]
    pub default_retry_attempts: u32,

    /// Backoff strategy for retry sleeps
    #[serde(default)]
    pub retry_backoff: BackoffStrategy,

    /// Base delay in milliseconds fed into the backoff calculation
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// LLM completion transport settings
    #[serde(default)]
    pub llm: LlmSection,
}

/// Log level for engine records
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warning,
    Error,
}

/// Backoff strategy applied between retry attempts
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    Linear,
    #[default]
    Exponential,
}

/// LLM transport section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Override for the completion endpoint base URL
    pub base_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: None,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            default_retry_attempts: default_retry_attempts(),
            retry_backoff: BackoffStrategy::default(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            llm: LlmSection::default(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FrameworkConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: FrameworkConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_retry_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "default_retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry_base_delay_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "retry_base_delay_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the LLM API key from the configured environment variable
    pub fn llm_api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.llm.api_key_env)
            .map_err(|_| ConfigError::EnvVarNotFound(self.llm.api_key_env.clone()))
    }

    /// LLM request timeout as a Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FrameworkConfig::default();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.default_retry_attempts, 3);
        assert_eq!(config.retry_backoff, BackoffStrategy::Exponential);
        assert_eq!(config.retry_base_delay_ms, 1000);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.llm.timeout_secs, 60);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: FrameworkConfig = toml::from_str("").unwrap();
        assert_eq!(config, FrameworkConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            log_level = "info"
            default_retry_attempts = 5
            retry_backoff = "linear"
            retry_base_delay_ms = 250

            [llm]
            api_key_env = "MY_LLM_KEY"
            base_url = "http://localhost:8080/v1"
            timeout_secs = 10
        "#;

        let config: FrameworkConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.default_retry_attempts, 5);
        assert_eq!(config.retry_backoff, BackoffStrategy::Linear);
        assert_eq!(config.retry_base_delay_ms, 250);
        assert_eq!(config.llm.api_key_env, "MY_LLM_KEY");
        assert_eq!(
            config.llm.base_url,
            Some("http://localhost:8080/v1".to_string())
        );
        assert_eq!(config.llm_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_zero_retry_attempts() {
        let config = FrameworkConfig {
            default_retry_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_base_delay() {
        let config = FrameworkConfig {
            retry_base_delay_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_llm_api_key_missing_env() {
        let config = FrameworkConfig {
            llm: LlmSection {
                api_key_env: "AGENTFLOW_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.llm_api_key(),
            Err(ConfigError::EnvVarNotFound(_))
        ));
    }
}
