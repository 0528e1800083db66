// src/error.rs

//! Error types for framework resolution
//!
//! Settings errors (`InvalidRollForwardValue`, `CollisionError`) are raised while
//! reading configuration, before any framework is looked up. Resolution errors
//! (`NoCompatibleVersion`, `ReconcileFailure`) always name the framework and the
//! versions involved.

use thiserror::Error;

/// Errors produced while resolving framework references
#[derive(Error, Debug)]
pub enum Error {
    /// A roll-forward setting value could not be parsed
    #[error("Invalid value '{value}' for setting '{setting}'")]
    InvalidRollForwardValue { setting: String, value: String },

    /// Two mutually exclusive settings were specified in one scope
    #[error("It's invalid to use both '{first}' and '{second}' in {scope}")]
    CollisionError {
        scope: String,
        first: String,
        second: String,
    },

    /// No installed version satisfies a reference under its policy
    #[error(
        "It was not possible to find any compatible framework version: \
         framework '{framework}', version '{requested}' (roll forward: {policy})"
    )]
    NoCompatibleVersion {
        framework: String,
        requested: String,
        policy: String,
    },

    /// Two references to the same framework cannot be satisfied together
    #[error(
        "The specified framework '{framework}', version '{requested}' is incompatible \
         with the previously referenced version '{conflicting}'"
    )]
    ReconcileFailure {
        framework: String,
        requested: String,
        conflicting: String,
    },

    /// A version string could not be parsed
    #[error("Invalid framework version '{0}'")]
    InvalidVersion(String),

    /// A runtime configuration file is malformed
    #[error("Invalid runtime configuration {path}: {reason}")]
    ConfigError { path: String, reason: String },

    /// I/O error while reading frameworks or configuration
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Resolution kept restarting without reaching a fixed point
    #[error("Framework resolution did not converge after {0} restarts")]
    RestartLimitExceeded(usize),
}

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an `InvalidRollForwardValue` error
    pub fn invalid_value(setting: &str, value: impl Into<String>) -> Self {
        Self::InvalidRollForwardValue {
            setting: setting.to_string(),
            value: value.into(),
        }
    }

    /// Whether this error was raised while reading settings, before any lookup
    pub fn is_settings_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRollForwardValue { .. } | Self::CollisionError { .. }
        )
    }
}
