//! Error types for Prometheus client operations.
//!
//! This module defines the error types that can occur when querying a
//! Prometheus-compatible backend through the prometheus_client crate.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during Prometheus client operations.
///
/// This enum represents all possible error conditions when talking to a
/// Prometheus-compatible HTTP API, including transport failures, unexpected
/// status codes, and malformed responses. Each variant provides specific
/// context for debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to construct the underlying HTTP client.
    ///
    /// This error occurs when the reqwest client builder rejects the
    /// configured options (for example an invalid default header value).
    #[error("Failed to initialize Prometheus HTTP client: {0}")]
    ClientBuild(String),

    /// The configured Prometheus URL could not be parsed or joined with an
    /// API path.
    #[error("Invalid Prometheus URL: {0}")]
    InvalidUrl(String),

    /// A configured header name or value is not valid HTTP header syntax.
    #[error("Invalid HTTP header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The HTTP request failed at the transport level.
    ///
    /// This covers connection failures, DNS errors, and per-call timeouts.
    #[error("Prometheus request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status code.
    #[error("Prometheus returned status {status} for {endpoint}: {body}")]
    UnexpectedStatus {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// The backend answered 2xx but the response body did not have the
    /// expected shape, or carried `"status": "error"`.
    #[error("Unexpected Prometheus response for {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    /// A previous attempt at the same query failed and the failure was
    /// served from the cache instead of re-issuing the network call.
    #[error("Query failed previously (cached): {0}")]
    CachedFailure(String),
}
