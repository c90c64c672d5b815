//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// One rule a configuration value broke.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("expiry_duration_ms must be greater than zero")]
    ZeroExpiry,

    #[error("fare_amount must not be empty")]
    EmptyFare,
}

/// Errors that can occur while loading terminal configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// One or more values failed validation
    #[error("Invalid config: {}", describe(.0))]
    Invalid(Vec<ConfigViolation>),
}

fn describe(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
