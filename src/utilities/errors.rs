//! Error types for the creative orchestrator.
//!
//! Every fallible orchestration operation returns [`OrchestratorError`].
//! Validation variants are raised synchronously before any backend I/O;
//! `Timeout` and `ProviderError` only come out of a generation call.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Closed taxonomy of orchestration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidIntensity,
    InvalidProfile,
    InvalidPrompt,
    InvalidTask,
    Timeout,
    ProviderError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidIntensity => "InvalidIntensity",
            Self::InvalidProfile => "InvalidProfile",
            Self::InvalidPrompt => "InvalidPrompt",
            Self::InvalidTask => "InvalidTask",
            Self::Timeout => "Timeout",
            Self::ProviderError => "ProviderError",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the agent, the pipeline and the trip lifecycle.
#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// Unknown intensity level, missing preset, or an out-of-range effect override.
    #[error("Invalid intensity: {0}")]
    InvalidIntensity(String),

    /// Role profile is missing its role or content.
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Message sequence handed to `generate` is empty or malformed.
    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    /// Pipeline task is missing messages or declares an unsupported type.
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// The backend did not answer within the agent's wall-clock budget.
    #[error("Generation timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// The backend (or the HTTP layer in front of it) reported a failure.
    #[error("Provider error{}: {message}", status_suffix(.status))]
    ProviderError {
        status: Option<u16>,
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl OrchestratorError {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIntensity(_) => ErrorKind::InvalidIntensity,
            Self::InvalidProfile(_) => ErrorKind::InvalidProfile,
            Self::InvalidPrompt(_) => ErrorKind::InvalidPrompt,
            Self::InvalidTask(_) => ErrorKind::InvalidTask,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ProviderError { .. } => ErrorKind::ProviderError,
        }
    }

    /// Shorthand for a provider failure with an HTTP status.
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ProviderError {
            status,
            message: message.into(),
        }
    }

    /// Whether this error was raised by input validation (before any I/O).
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Timeout { .. } | Self::ProviderError { .. })
    }
}

impl From<reqwest::Error> for OrchestratorError {
    fn from(err: reqwest::Error) -> Self {
        Self::ProviderError {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors raised while loading or validating [`OrchestratorConfig`](crate::utilities::config::OrchestratorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading the configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value is out of its accepted range.
    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            OrchestratorError::InvalidTask("x".into()).kind(),
            ErrorKind::InvalidTask
        );
        assert_eq!(
            OrchestratorError::Timeout {
                after: Duration::from_millis(5)
            }
            .kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            OrchestratorError::provider(Some(500), "boom").kind(),
            ErrorKind::ProviderError
        );
    }

    #[test]
    fn test_display_includes_status() {
        let err = OrchestratorError::provider(Some(429), "rate limited");
        assert_eq!(err.to_string(), "Provider error (429): rate limited");

        let err = OrchestratorError::provider(None, "connection reset");
        assert_eq!(err.to_string(), "Provider error: connection reset");
    }

    #[test]
    fn test_timeout_display() {
        let err = OrchestratorError::Timeout {
            after: Duration::from_millis(180_000),
        };
        assert_eq!(err.to_string(), "Generation timed out after 180000ms");
    }

    #[test]
    fn test_is_validation() {
        assert!(OrchestratorError::InvalidProfile("x".into()).is_validation());
        assert!(!OrchestratorError::provider(None, "x").is_validation());
    }
}
