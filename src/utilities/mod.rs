//! Shared utilities: configuration loading, error types and text helpers.

pub mod config;
pub mod errors;
pub mod string_utils;

pub use config::OrchestratorConfig;
pub use errors::{ConfigError, ErrorKind, OrchestratorError, Result};
