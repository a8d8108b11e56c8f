//! Error types for the LLM layer

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the remote model
#[derive(Debug, Error)]
pub enum LlmError {
    /// Rejected or missing API key
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// HTTP request failures (status 0 when no response was received)
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// JSON encoding/decoding issues
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The provider refused the request as malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded (retry after {retry_after:?})")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Provider-specific errors, e.g. a prompt blocked by safety filters
    #[error("Provider error ({code}): {message}")]
    ProviderError { code: String, message: String },
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        // The URL never carries credentials for Gemini, but strip it anyway so
        // error text stays short.
        let err = err.without_url();
        if err.is_decode() {
            return LlmError::SerializationError(err.to_string());
        }
        LlmError::HttpError {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}
