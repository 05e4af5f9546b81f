//! Error types for the validation core.
//!
//! Parse errors are scoped to one rule file and recorded on its report; the
//! run continues with the remaining files. Configuration errors (unknown
//! validator type, malformed parameters) are raised before any file is
//! processed and abort the run.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while parsing rule files.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The rule file could not be read from disk.
    #[error("Failed to read rule file {path}: {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// The rule file is not valid YAML or does not match the expected
    /// schema.
    #[error("Failed to parse rule file {path}: {reason}")]
    InvalidYaml { path: String, reason: String },

    /// A rule group declares `source_tenants` but tenant support was not
    /// enabled for this run.
    #[error("Rule group `{group}` in {path} declares source_tenants but tenant support is not enabled")]
    SourceTenantsDisabled { path: String, group: String },
}

/// Errors raised while building validators from configuration.
///
/// These are fatal: they surface before any file is validated.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration names a validator type that does not exist.
    #[error("Unknown validator type `{validator_type}`")]
    UnknownValidatorType { validator_type: String },

    /// A validator's parameters are missing, malformed, or carry unknown
    /// fields.
    #[error("Invalid parameters for validator `{validator_type}`: {reason}")]
    InvalidParams {
        validator_type: String,
        reason: String,
    },
}

/// A duration string that is not a valid Prometheus duration.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("`{0}` is not a valid duration (expected e.g. `30s`, `5m`, `1h30m`)")]
pub struct InvalidDuration(pub String);
