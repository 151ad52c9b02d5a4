//! Progress stream registry
//!
//! Owns the live event streams. At most one handle per [`StreamKind`] is
//! alive at any time; opening a kind that is already open closes the old
//! handle first.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::task::JoinHandle;

use super::events::AppEvent;
use super::state::SharedState;
use super::transcript::Transcript;
use crate::core::{ModfixReply, ModfixStatus, StreamSource};

/// Entry appended when a stream ends for any reason other than an explicit close
pub const STREAM_ENDED: &str = "⚠️ ModFix stream ended or failed.";
/// Entry appended when the stream reports that the Mods folder was not found
pub const STREAM_NEEDS_PATH: &str =
    "📁 ModFix could not find your Mods folder automatically. Please provide its location.";

/// Kind of server-push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Live ModFix progress
    ModFix,
}

impl StreamKind {
    /// Backend resource the stream is tied to
    pub fn path(&self) -> &'static str {
        match self {
            StreamKind::ModFix => "/modfix/stream",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StreamKind::ModFix => "ModFix",
        }
    }
}

struct ActiveStream {
    id: u64,
    live: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ActiveStream {
    /// Stop deliveries immediately; the task is cancelled at its next await
    ///
    /// Returns false if the task had already finished on its own, in which
    /// case it reports its own end.
    fn kill(&self) -> bool {
        let was_live = self.live.swap(false, Ordering::SeqCst);
        self.task.abort();
        was_live
    }
}

type ActiveMap = Arc<Mutex<HashMap<StreamKind, ActiveStream>>>;

/// How a stream task finished on its own
enum StreamOutcome {
    /// Backend closed the channel or it broke
    Terminated(String),
    /// Backend asked for a manual Mods folder path
    ManualPathRequired,
}

/// Registry of live progress streams
#[derive(Clone)]
pub struct StreamRegistry {
    source: Arc<dyn StreamSource>,
    active: ActiveMap,
    next_id: Arc<AtomicU64>,
    transcript: Transcript,
    state: SharedState,
}

impl StreamRegistry {
    pub fn new(source: Arc<dyn StreamSource>, transcript: Transcript, state: SharedState) -> Self {
        Self {
            source,
            active: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            transcript,
            state,
        }
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, HashMap<StreamKind, ActiveStream>> {
        lock_map(&self.active)
    }

    /// Open a fresh stream of `kind`, closing any prior one first
    ///
    /// Returns the id of the new handle.
    pub async fn open(&self, kind: StreamKind) -> u64 {
        self.close(kind).await;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let live = Arc::new(AtomicBool::new(true));

        {
            // Held across spawn so the task cannot release itself before it is registered
            let mut active = self.lock_active();
            let task = tokio::spawn(consume(
                kind,
                id,
                live.clone(),
                self.source.clone(),
                self.active.clone(),
                self.transcript.clone(),
                self.state.clone(),
            ));
            if let Some(raced) = active.insert(kind, ActiveStream { id, live, task }) {
                // Another open slipped in between close() and here
                let _ = raced.kill();
            }
        }

        tracing::info!(stream = kind.label(), id, "stream opened");
        self.state.emit(AppEvent::StreamOpened(kind));
        id
    }

    /// Close the stream of `kind`, if any
    ///
    /// Waits until the consuming task is gone, so no delivery from the old
    /// handle can be appended after this returns. Deliveries already
    /// appended stay in the transcript. Returns whether a live stream was
    /// closed.
    pub async fn close(&self, kind: StreamKind) -> bool {
        let Some(stream) = self.lock_active().remove(&kind) else {
            return false;
        };
        let was_live = stream.kill();
        let _ = stream.task.await;
        if !was_live {
            return false;
        }

        tracing::info!(stream = kind.label(), id = stream.id, "stream closed");
        self.state.emit(AppEvent::StreamClosed(kind));
        true
    }

    pub fn is_active(&self, kind: StreamKind) -> bool {
        self.lock_active().contains_key(&kind)
    }

    /// Id of the live handle for `kind`
    pub fn active_id(&self, kind: StreamKind) -> Option<u64> {
        self.lock_active().get(&kind).map(|s| s.id)
    }

    pub fn active_count(&self) -> usize {
        self.lock_active().len()
    }
}

fn lock_map(map: &ActiveMap) -> std::sync::MutexGuard<'_, HashMap<StreamKind, ActiveStream>> {
    map.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Stream registry lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

fn is_manual_path_sentinel(text: &str) -> bool {
    serde_json::from_str::<ModfixReply>(text)
        .map(|reply| reply.status() == ModfixStatus::ManualRequired)
        .unwrap_or(false)
}

async fn consume(
    kind: StreamKind,
    id: u64,
    live: Arc<AtomicBool>,
    source: Arc<dyn StreamSource>,
    active: ActiveMap,
    transcript: Transcript,
    state: SharedState,
) {
    let outcome = match source.open(kind.path()).await {
        Ok(mut events) => loop {
            match events.next().await {
                Some(Ok(text)) => {
                    if !live.load(Ordering::SeqCst) {
                        return;
                    }
                    if is_manual_path_sentinel(&text) {
                        break StreamOutcome::ManualPathRequired;
                    }
                    transcript.bot(text);
                }
                Some(Err(e)) => break StreamOutcome::Terminated(e.to_string()),
                None => break StreamOutcome::Terminated("closed by backend".to_string()),
            }
        },
        Err(e) => StreamOutcome::Terminated(e.to_string()),
    };

    // Closed by the owner while finishing: the owner reports it
    if !live.swap(false, Ordering::SeqCst) {
        return;
    }
    {
        let mut map = lock_map(&active);
        if map.get(&kind).is_some_and(|s| s.id == id) {
            map.remove(&kind);
        }
    }

    match outcome {
        StreamOutcome::Terminated(reason) => {
            tracing::warn!(stream = kind.label(), id, %reason, "stream terminated");
            transcript.error(STREAM_ENDED);
        }
        StreamOutcome::ManualPathRequired => {
            tracing::info!(stream = kind.label(), id, "backend requested manual path");
            transcript.system(STREAM_NEEDS_PATH);
            state.emit(AppEvent::ManualPathRequested);
        }
    }
    state.emit(AppEvent::StreamClosed(kind));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventStream, TransportError};

    #[test]
    fn test_manual_path_sentinel_detection() {
        assert!(is_manual_path_sentinel(r#"{"status": "manual_required"}"#));
        assert!(!is_manual_path_sentinel(r#"{"status": "success"}"#));
        assert!(!is_manual_path_sentinel("🧩 Starting ModFix..."));
        assert!(!is_manual_path_sentinel("manual_required"));
    }

    #[test]
    fn test_stream_kind_path() {
        assert_eq!(StreamKind::ModFix.path(), "/modfix/stream");
    }

    struct NeverOpens;

    #[async_trait::async_trait]
    impl StreamSource for NeverOpens {
        async fn open(&self, _path: &str) -> Result<EventStream, TransportError> {
            Err(TransportError::StreamRejected(503))
        }
    }

    #[tokio::test]
    async fn test_close_after_task_ended_on_its_own_stays_quiet() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let state = SharedState::new(tx.clone());
        let registry = StreamRegistry::new(Arc::new(NeverOpens), Transcript::new(tx), state);

        // Task already marked itself dead but has not released the slot yet
        let live = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(async {});
        registry
            .lock_active()
            .insert(StreamKind::ModFix, ActiveStream { id: 7, live, task });

        assert!(!registry.close(StreamKind::ModFix).await);
        assert!(!registry.is_active(StreamKind::ModFix));
        assert!(rx.try_recv().is_err());
    }
}
