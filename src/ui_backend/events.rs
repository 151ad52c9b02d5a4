//! Application Events
//!
//! Events sent from the orchestration engine to whatever renders it.

use super::approval::ChoiceCard;
use super::streams::StreamKind;
use super::transcript::TranscriptEntry;
use crate::core::Mode;

/// Events emitted by the engine to the frontend
///
/// Sent over an unbounded mpsc channel in the order the underlying state
/// changed. A renderer that applies them in arrival order reproduces the
/// transcript exactly.
#[derive(Debug, Clone)]
pub enum AppEvent {
    // ========== Transcript ==========
    /// An entry was appended to the transcript
    EntryAppended(TranscriptEntry),

    // ========== UI State ==========
    /// The interaction mode changed; `button_id` is now the only active affordance
    ModeChanged { mode: Mode, button_id: String },

    /// Allow/Deny affordances became visible
    ChoicesShown(ChoiceCard),

    /// Allow/Deny affordances were removed
    ChoicesRemoved,

    // ========== Streams ==========
    /// A progress stream was attached
    StreamOpened(StreamKind),

    /// A progress stream was released
    StreamClosed(StreamKind),

    /// The backend could not find the Mods folder and needs a manual path
    ManualPathRequested,
}
