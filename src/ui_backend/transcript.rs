//! Transcript Sink
//!
//! Append-only, ordered record of everything shown in the conversation.

use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use super::events::AppEvent;

/// Category of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    System,
    User,
    Bot,
    Error,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Bot => "bot",
            Self::Error => "error",
        }
    }
}

/// A single rendered entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Position in the transcript, starting at 0
    pub seq: usize,
    pub kind: EntryKind,
    pub text: String,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

/// Append-only transcript shared by every component of the engine
///
/// Entries are never removed or reordered. Each append is forwarded to the
/// event channel while the write lock is held, so subscribers observe
/// exactly the stored order.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Arc<RwLock<Vec<TranscriptEntry>>>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Transcript {
    pub fn new(event_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            event_tx,
        }
    }

    /// Append a categorized entry
    pub fn append(&self, kind: EntryKind, text: impl Into<String>) -> TranscriptEntry {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!("Transcript lock was poisoned, recovering");
            poisoned.into_inner()
        });
        let entry = TranscriptEntry {
            seq: entries.len(),
            kind,
            text: text.into(),
            timestamp: chrono::Local::now(),
        };
        tracing::trace!(seq = entry.seq, kind = kind.label(), "transcript entry");
        entries.push(entry.clone());
        // A dropped receiver only means nobody is rendering
        let _ = self.event_tx.send(AppEvent::EntryAppended(entry.clone()));
        entry
    }

    pub fn system(&self, text: impl Into<String>) -> TranscriptEntry {
        self.append(EntryKind::System, text)
    }

    pub fn user(&self, text: impl Into<String>) -> TranscriptEntry {
        self.append(EntryKind::User, text)
    }

    pub fn bot(&self, text: impl Into<String>) -> TranscriptEntry {
        self.append(EntryKind::Bot, text)
    }

    pub fn error(&self, text: impl Into<String>) -> TranscriptEntry {
        self.append(EntryKind::Error, text)
    }

    /// Snapshot of all entries
    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn count(&self, kind: EntryKind) -> usize {
        self.read().iter().filter(|e| e.kind == kind).count()
    }

    pub fn last(&self) -> Option<TranscriptEntry> {
        self.read().last().cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<TranscriptEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            tracing::warn!("Transcript lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
