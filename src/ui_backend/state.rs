//! Shared Session State
//!
//! The session context held by the engine: the single mode slot, the active
//! affordance and the consent handshake. Replaces page-level globals with one
//! explicitly owned object; last write wins.

use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use super::approval::{ChoiceCard, HandshakeState};
use super::errors::OrchestrationError;
use super::events::AppEvent;
use crate::core::Mode;

#[derive(Debug, Default)]
struct StateInner {
    /// `None` until a mode has been selected; never cleared by failures
    mode: Option<Mode>,
    /// At most one active affordance, always matching `mode`
    active_button: Option<String>,
    handshake: HandshakeState,
}

/// Thread-safe session context
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<RwLock<StateInner>>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl SharedState {
    pub fn new(event_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StateInner::default())),
            event_tx,
        }
    }

    // ========== Private Helpers ==========

    /// Get a read lock on the inner state, recovering from poison
    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, StateInner> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::warn!("SharedState read lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Get a write lock on the inner state, recovering from poison
    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, StateInner> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::warn!("SharedState write lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub(crate) fn emit(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }

    // ========== Getters ==========

    pub fn mode(&self) -> Option<Mode> {
        self.read_inner().mode
    }

    pub fn active_button(&self) -> Option<String> {
        self.read_inner().active_button.clone()
    }

    pub fn handshake(&self) -> HandshakeState {
        self.read_inner().handshake.clone()
    }

    /// Visible Allow/Deny card, if any
    pub fn pending_choices(&self) -> Option<ChoiceCard> {
        self.read_inner().handshake.card().cloned()
    }

    // ========== Mode ==========

    pub fn set_mode(&self, mode: Mode) {
        self.write_inner().mode = Some(mode);
    }

    /// Mark the affordance for `mode` as the only active one
    pub fn mark_active(&self, mode: Mode) {
        let button_id = mode.button_id();
        self.write_inner().active_button = Some(button_id.clone());
        self.emit(AppEvent::ModeChanged { mode, button_id });
    }

    // ========== Handshake ==========

    /// Reset to `AwaitingConsent` for a new advisory request
    pub fn begin_handshake(&self) {
        let was_visible = {
            let mut inner = self.write_inner();
            let was_visible = inner.handshake.choices_visible();
            inner.handshake = HandshakeState::AwaitingConsent;
            was_visible
        };
        if was_visible {
            self.emit(AppEvent::ChoicesRemoved);
        }
    }

    pub fn show_choices(&self, prompt: impl Into<String>) -> ChoiceCard {
        let card = self.write_inner().handshake.confirm(prompt);
        self.emit(AppEvent::ChoicesShown(card.clone()));
        card
    }

    pub fn allow(&self) -> Result<(), OrchestrationError> {
        self.write_inner().handshake.allow()
    }

    pub fn deny(&self) -> Result<(), OrchestrationError> {
        self.write_inner().handshake.deny()?;
        self.emit(AppEvent::ChoicesRemoved);
        Ok(())
    }

    /// Finish the handshake and take the affordances off screen
    pub fn resolve_handshake(&self) {
        let was_visible = self.write_inner().handshake.resolve();
        if was_visible {
            self.emit(AppEvent::ChoicesRemoved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_slot_last_write_wins() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let state = SharedState::new(tx);
        assert_eq!(state.mode(), None);

        state.set_mode(Mode::Cheats);
        state.mark_active(Mode::Cheats);
        state.set_mode(Mode::ReadSave);
        state.mark_active(Mode::ReadSave);

        assert_eq!(state.mode(), Some(Mode::ReadSave));
        assert_eq!(state.active_button().as_deref(), Some("btn-read_save"));
    }

    #[test]
    fn test_choice_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let state = SharedState::new(tx);

        state.show_choices("Proceed?");
        state.deny().unwrap();

        assert!(matches!(rx.try_recv(), Ok(AppEvent::ChoicesShown(card)) if card.prompt == "Proceed?"));
        assert!(matches!(rx.try_recv(), Ok(AppEvent::ChoicesRemoved)));
        assert!(state.pending_choices().is_none());
    }

    #[test]
    fn test_restart_removes_visible_card() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let state = SharedState::new(tx);
        state.show_choices("Proceed?");
        let _ = rx.try_recv();

        state.begin_handshake();
        assert!(matches!(rx.try_recv(), Ok(AppEvent::ChoicesRemoved)));
        assert_eq!(state.handshake(), HandshakeState::AwaitingConsent);
    }
}
