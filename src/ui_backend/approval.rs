//! Consent card and handshake state for the ModFix scan

use super::errors::OrchestrationError;

/// One of the two user-facing choices on a consent card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Allow,
    Deny,
}

impl Choice {
    pub fn all() -> &'static [Choice] {
        &[Choice::Allow, Choice::Deny]
    }

    /// Affordance identifier, also reported in click telemetry
    pub fn id(&self) -> &'static str {
        match self {
            Choice::Allow => "allow-scan",
            Choice::Deny => "deny-scan",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Choice::Allow => "✅ Allow",
            Choice::Deny => "❌ Deny",
        }
    }
}

/// Allow/Deny card shown while the backend waits for consent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceCard {
    /// Prompt text returned by the advisory request
    pub prompt: String,
    /// Whether the user has responded
    pub responded: bool,
    /// Whether the user approved
    pub approved: bool,
}

impl ChoiceCard {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            responded: false,
            approved: false,
        }
    }

    pub fn choices(&self) -> &'static [Choice] {
        Choice::all()
    }

    pub fn approve(&mut self) {
        self.responded = true;
        self.approved = true;
    }
}

/// Where the two-step consent exchange currently stands
///
/// The consent request may only be issued from `Confirming`, which is
/// reachable only after the advisory request returned `confirm`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HandshakeState {
    /// Advisory request not yet answered
    #[default]
    AwaitingConsent,
    /// Prompt shown, waiting for Allow or Deny
    Confirming(ChoiceCard),
    /// Allowed; consent request in flight. The card stays visible but inert
    Consenting(ChoiceCard),
    /// Terminal: answered directly, denied, completed or failed
    Resolved,
}

impl HandshakeState {
    /// The card, while its affordances are on screen
    pub fn card(&self) -> Option<&ChoiceCard> {
        match self {
            Self::Confirming(card) | Self::Consenting(card) => Some(card),
            _ => None,
        }
    }

    pub fn choices_visible(&self) -> bool {
        self.card().is_some()
    }

    /// Show the prompt returned by the advisory request
    pub fn confirm(&mut self, prompt: impl Into<String>) -> ChoiceCard {
        let card = ChoiceCard::new(prompt);
        *self = Self::Confirming(card.clone());
        card
    }

    /// Record an Allow; only valid while confirming
    pub fn allow(&mut self) -> Result<(), OrchestrationError> {
        match std::mem::take(self) {
            Self::Confirming(mut card) => {
                card.approve();
                *self = Self::Consenting(card);
                Ok(())
            }
            other => {
                *self = other;
                Err(OrchestrationError::NoPendingConfirmation)
            }
        }
    }

    /// Record a Deny; only valid while confirming
    pub fn deny(&mut self) -> Result<(), OrchestrationError> {
        match self {
            Self::Confirming(_) => {
                *self = Self::Resolved;
                Ok(())
            }
            _ => Err(OrchestrationError::NoPendingConfirmation),
        }
    }

    /// Move to the terminal state, returning whether a card was visible
    pub fn resolve(&mut self) -> bool {
        let was_visible = self.choices_visible();
        *self = Self::Resolved;
        was_visible
    }
}
