//! Error types for pipeline execution
//!
//! One error enum covers every way a pipeline can fail. LLM router errors
//! are a special case: the worker logs them and falls back to the outcome
//! chosen by the agent's own task handler instead of aborting the pipeline.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Unknown outcome '{outcome}' for agent '{agent}'")]
    UnknownOutcome { agent: String, outcome: String },

    #[error("Max retry attempts ({max_attempts}) exceeded")]
    RetryExhausted { max_attempts: u32 },

    #[error("LLM router error: {message}")]
    LlmRouter { message: String },

    #[error("Task failed: {message}")]
    Task { message: String },

    #[error("Routing error: {message}")]
    Routing { message: String },

    #[error("Pipeline crashed: {message}")]
    Crashed { message: String },

    #[error("Invalid agent definition: {message}")]
    Definition { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl PipelineError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an unknown-outcome error
    pub fn unknown_outcome<A: Into<String>, O: Into<String>>(agent: A, outcome: O) -> Self {
        Self::UnknownOutcome {
            agent: agent.into(),
            outcome: outcome.into(),
        }
    }

    /// Create a retry-exhaustion error
    pub fn retry_exhausted(max_attempts: u32) -> Self {
        Self::RetryExhausted { max_attempts }
    }

    /// Create an LLM router error
    pub fn llm_router<S: Into<String>>(message: S) -> Self {
        Self::LlmRouter {
            message: message.into(),
        }
    }

    /// Create a user task error
    pub fn task<S: Into<String>>(message: S) -> Self {
        Self::Task {
            message: message.into(),
        }
    }

    /// Create a routing error
    pub fn routing<S: Into<String>>(message: S) -> Self {
        Self::Routing {
            message: message.into(),
        }
    }

    /// Create a pipeline-crashed error
    pub fn crashed<S: Into<String>>(message: S) -> Self {
        Self::Crashed {
            message: message.into(),
        }
    }

    /// Create an agent definition error
    pub fn definition<S: Into<String>>(message: S) -> Self {
        Self::Definition {
            message: message.into(),
        }
    }

    /// Whether the worker treats this error as fatal to the pipeline.
    ///
    /// `LlmRouter` errors are absorbed by the worker, which keeps the
    /// outcome chosen by the task handler. Everything else aborts.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PipelineError::LlmRouter { .. })
    }
}

impl From<crate::schema::SchemaError> for PipelineError {
    fn from(error: crate::schema::SchemaError) -> Self {
        PipelineError::definition(error.to_string())
    }
}

static SECRET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").unwrap());

static SENSITIVE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+").unwrap()
});

/// Sanitize error messages before they cross a logging or API boundary.
///
/// LLM transport errors can echo request headers and response bodies, so
/// anything resembling a credential is redacted and long messages capped.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = SECRET_PATTERN.replace_all(message, "${1}=***").to_string();

    sanitized = SENSITIVE_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > 500 {
        let truncate_suffix = "...[truncated]";
        let max_content_len = 500 - truncate_suffix.len();
        sanitized = format!("{}{}", &sanitized[..max_content_len], truncate_suffix);
    }

    sanitized
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
