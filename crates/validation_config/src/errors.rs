//! Configuration system error types.
//!
//! Every error here is fatal: configuration problems surface before any
//! rule file is processed and abort the run.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors loading or interpreting the operator configuration.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to read configuration file {path}: {reason}")]
    FileRead { path: String, reason: String },

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },

    #[error("Invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("Duplicate validation rule name `{name}`")]
    DuplicateRuleName { name: String },

    #[error("Unknown validation rule `{name}` passed to {flag}")]
    UnknownRuleName { name: String, flag: String },

    /// A validator failed to construct (unknown type, bad parameters).
    #[error(transparent)]
    Validator(#[from] rule_guard_core::ConfigError),
}

/// Result type alias for configuration operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
