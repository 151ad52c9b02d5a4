//! Typed errors for the orchestration layer
//!
//! Every variant that reaches a user is rendered as exactly one transcript
//! entry by the flow that produced it; the value is also returned to the
//! caller so frontends can react without re-reading the transcript.

use thiserror::Error;

use crate::core::TransportError;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The exchange with the backend failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The backend answered with a status outside the expected set
    #[error("Unexpected status {status:?}: {}", .message.as_deref().unwrap_or("no message"))]
    Protocol {
        status: Option<String>,
        message: Option<String>,
    },

    /// The operator dismissed the path prompt
    #[error("Cancelled by user")]
    UserCancelled,

    /// Allow/Deny was chosen while no confirmation prompt is showing
    #[error("No confirmation is pending")]
    NoPendingConfirmation,
}

impl OrchestrationError {
    /// Silent failures append nothing to the transcript
    pub fn is_silent(&self) -> bool {
        matches!(self, OrchestrationError::UserCancelled)
    }
}
