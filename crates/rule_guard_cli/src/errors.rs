use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the RuleGuard CLI application.
///
/// Validation findings are not errors; they live in the report and only
/// decide the exit code. This enum covers the failures that stop a run
/// before a report can be produced at all.
#[derive(Error, Debug)]
pub enum Error {
    /// The operator configuration could not be loaded or interpreted.
    #[error("Configuration error: {0}")]
    Config(#[from] validation_config::ConfigurationError),

    /// A rule file pattern was not valid glob syntax.
    #[error("Invalid file pattern `{pattern}`: {reason}")]
    BadPattern { pattern: String, reason: String },

    /// No rule file matched any of the given patterns.
    ///
    /// Treated as fatal so a CI pipeline pointed at an empty or renamed
    /// directory fails loudly instead of passing on zero files.
    #[error("No rule files matched: {0}")]
    NoFilesMatched(String),

    /// The Prometheus client could not be constructed from configuration.
    #[error("Prometheus client error: {0}")]
    Prometheus(#[from] prometheus_client::Error),

    /// The report could not be rendered in the requested format.
    #[error("Failed to render report: {0}")]
    Render(String),
}
