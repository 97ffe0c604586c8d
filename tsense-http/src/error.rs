//! HTTP transport error types.

use thiserror::Error;

/// Result type for HTTP transport operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// Failures raised by the transport itself.
///
/// A response with a non-2xx status is not an error at this layer; callers
/// inspect [`Response::status`](crate::Response::status) and decide.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// Request failed after all retries exhausted.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Last error message.
        message: String,
    },

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
