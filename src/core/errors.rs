//! Transport error types
//!
//! Failures of the request/response and streaming exchanges with the backend.
//! Outcome-level problems (an unexpected `status` value in a parsed body) are
//! not transport errors; those live in the ui_backend layer.

use thiserror::Error;

/// Failure of a single exchange with the backend
///
/// Never retried automatically and never fatal to the session: the
/// orchestration layer turns each one into a single transcript entry.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout, or the request could not be sent
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be read as text
    #[error("Unreadable response body: {0}")]
    Body(String),

    /// The body was read but is not the structured payload we expected
    #[error("Malformed response (HTTP {status}): {reason}")]
    Malformed { status: u16, reason: String },

    /// The request payload could not be encoded as JSON
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    /// The endpoint path could not be joined onto the backend base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A stream was refused by the backend when it was opened
    #[error("Stream rejected (HTTP {0})")]
    StreamRejected(u16),
}

impl TransportError {
    /// Classify a reqwest failure
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            TransportError::Network(format!("Connection failed: {}", e))
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }

    /// Whether the backend was never reached
    pub fn is_network(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }
}

impl From<url::ParseError> for TransportError {
    fn from(e: url::ParseError) -> Self {
        TransportError::InvalidUrl(e.to_string())
    }
}
