//! Terminal configuration.
//!
//! Values come from an optional JSON file and command-line overrides. Every
//! rule is checked before the terminal starts and all violations are
//! reported together, using `stillwater`'s `Validation` to accumulate them.
//!
//! # Example
//!
//! ```rust
//! use farebox::config::TerminalConfig;
//! use std::time::Duration;
//!
//! let config = TerminalConfig::from_json(r#"{ "expiry_duration_ms": 3000 }"#).unwrap();
//! assert_eq!(config.expiry_duration(), Duration::from_secs(3));
//! assert_eq!(config.fare_amount, "₼0.50");
//! ```

pub mod error;

pub use error::{ConfigError, ConfigViolation};

use crate::core::DEFAULT_HISTORY_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// How long a presented card stays on screen without a verdict.
pub const DEFAULT_EXPIRY_MS: u64 = 5_000;

/// Fare shown while idle.
pub const DEFAULT_FARE_AMOUNT: &str = "₼0.50";

type Check = Validation<(), NonEmptyVec<ConfigViolation>>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerminalConfig {
    pub expiry_duration_ms: u64,
    pub fare_amount: String,
    /// Show only the last four PAN digits.
    pub mask_pan: bool,
    pub history_capacity: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            expiry_duration_ms: DEFAULT_EXPIRY_MS,
            fare_amount: DEFAULT_FARE_AMOUNT.to_string(),
            mask_pan: false,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    pub expiry_duration_ms: Option<u64>,
    pub mask_pan: bool,
}

impl TerminalConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validated()
    }

    /// Load from `path`, or use defaults when no path is given.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str(&raw)?
            }
            None => Self::default(),
        };
        base.with_overrides(overrides).validated()
    }

    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(ms) = overrides.expiry_duration_ms {
            self.expiry_duration_ms = ms;
        }
        self.mask_pan |= overrides.mask_pan;
        self
    }

    pub fn expiry_duration(&self) -> Duration {
        Duration::from_millis(self.expiry_duration_ms)
    }

    /// Check every rule, accumulating all violations.
    pub fn validate(&self) -> Check {
        let checks = vec![
            require(self.expiry_duration_ms > 0, ConfigViolation::ZeroExpiry),
            require(
                !self.fare_amount.trim().is_empty(),
                ConfigViolation::EmptyFare,
            ),
        ];
        Validation::all_vec(checks).map(|_| ())
    }

    fn validated(self) -> Result<Self, ConfigError> {
        match self.validate() {
            Validation::Success(_) => Ok(self),
            Validation::Failure(violations) => Err(ConfigError::Invalid(
                violations.iter().cloned().collect(),
            )),
        }
    }
}

fn require(ok: bool, violation: ConfigViolation) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation)
    }
}
