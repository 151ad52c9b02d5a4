//! Core traits for the domain layer
//!
//! These traits define the seams the orchestration engine depends on, so the
//! reqwest-backed implementations can be swapped for in-memory fakes in tests.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::errors::TransportError;

/// Raw reply of a request/response exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    /// HTTP status code
    pub status: u16,
    /// Body text, unparsed
    pub body: String,
}

impl RawReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Build a 200 reply from a JSON value
    pub fn ok_json(value: &Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// Whether the transport-level status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as structured data, regardless of status
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::Malformed {
            status: self.status,
            reason: e.to_string(),
        })
    }
}

/// Encode a typed payload as a request body
pub fn encode_body<T: Serialize>(payload: &T) -> Result<Value, TransportError> {
    serde_json::to_value(payload).map_err(|e| TransportError::Encode(e.to_string()))
}

/// Request/response exchanges with the backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `body` (if any) as JSON and return the raw reply
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<RawReply, TransportError>;

    /// Send and parse the reply body as JSON, ignoring the HTTP status
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        self.send(method, path, body).await?.json()
    }
}

/// Lazy, unbounded, non-restartable sequence of text events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// Server-initiated one-way text channels
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Open the channel for `path`
    ///
    /// The returned stream ends when the backend closes the channel; an `Err`
    /// item means the channel broke.
    async fn open(&self, path: &str) -> Result<EventStream, TransportError>;
}

/// Asks the operator for a single line of input
///
/// `None` means the operator dismissed the prompt.
#[async_trait]
pub trait PathPrompt: Send + Sync {
    async fn ask(&self, message: &str) -> Option<String>;
}
