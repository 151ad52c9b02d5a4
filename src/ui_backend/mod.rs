//! UI Backend - Backend-for-Frontend (BFF) Layer
//!
//! Keeps the conversation logic apart from whatever draws it, so the same
//! engine can drive the terminal frontend or a headless test harness.
//!
//! ## Architecture
//!
//! - **AppService**: the engine; turns commands into backend exchanges
//! - **AppEvent**: async event channel a renderer subscribes to
//! - **UiRenderer**: trait that frontends implement
//! - **SharedState**: mode slot, active button and consent handshake
//! - **Transcript**: append-only record of the conversation
//! - **StreamRegistry**: at most one live progress stream per kind
//! - **Command**: user actions mapped from slash commands / buttons

pub mod approval;
mod commands;
mod errors;
mod events;
mod resolver;
mod service;
mod state;
mod streams;
mod traits;
mod transcript;

pub use approval::{Choice, ChoiceCard, HandshakeState};
pub use commands::Command;
pub use errors::OrchestrationError;
pub use events::AppEvent;
pub use resolver::{ManualPathResolver, PATH_PROMPT};
pub use service::{
    AppService, CHAT_FAILED, CHEATS_FAILED, CHEATS_INTRO, HOWTO_ENTERING, HOWTO_READY,
    MODFIX_DENIED, MODFIX_GRANTED, MODFIX_PREPARING, NO_RESPONSE,
};
pub use state::SharedState;
pub use streams::{StreamKind, StreamRegistry, STREAM_ENDED, STREAM_NEEDS_PATH};
pub use traits::UiRenderer;
pub use transcript::{EntryKind, Transcript, TranscriptEntry};
