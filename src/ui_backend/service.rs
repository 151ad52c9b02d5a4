//! Application Service - Orchestration Engine
//!
//! Turns user commands into backend exchanges and records every outcome in
//! the transcript:
//! - mode selection and free-text chat
//! - the two-step ModFix consent handshake and its progress stream
//! - manual Mods folder recovery
//! - read-only cheats / how-to / EA folder lookups

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::Instrument;

use super::commands::Command;
use super::errors::OrchestrationError;
use super::events::AppEvent;
use super::resolver::ManualPathResolver;
use super::state::SharedState;
use super::streams::{StreamKind, StreamRegistry};
use super::transcript::Transcript;
use crate::config::ClientConfig;
use crate::core::{
    encode_body, iso_timestamp, ButtonClickEvent, ChatMessage, ChatResponse, CheatsReply,
    HowToReply, HowToRequest, LocateReply, Mode, ModfixReply, ModfixRequest, ModfixStatus,
    PathPrompt, RawReply, StreamSource, Transport, TransportError,
};

pub const CHAT_FAILED: &str = "⚠️ Something went wrong. Please try again.";
pub const NO_RESPONSE: &str = "No response received.";
pub const MODFIX_PREPARING: &str = "🧩 Preparing ModFix...";
pub const MODFIX_GRANTED: &str = "✅ Permission granted. Searching...";
pub const MODFIX_DENIED: &str = "❌ ModFix scan denied by user. No folders were searched.";
pub const CHEATS_FAILED: &str = "⚠️ No cheats found or failed to load.";
pub const HOWTO_ENTERING: &str = "📘 Entering How-To mode...";
pub const HOWTO_READY: &str = "How-To mode ready.";
pub const CHEATS_INTRO: &str = "💡 How to Use Cheats:\n\
    1️⃣ Press Ctrl + Shift + C (Windows) or Command + Shift + C (Mac) to open the cheat console.\n\
    2️⃣ Type testingcheats true and press Enter to enable cheats.\n\
    3️⃣ Once enabled, you can type or copy any of the cheats listed below.\n\
    \n\
    🎮 Loading Sims 4 cheats...";

fn request_span(path: &'static str) -> tracing::Span {
    tracing::debug_span!("backend", request_id = %uuid::Uuid::new_v4(), path)
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// Orchestration engine for one conversation
///
/// Cheap to clone; clones share the same session, transcript and streams.
#[derive(Clone)]
pub struct AppService {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    state: SharedState,
    transcript: Transcript,
    streams: StreamRegistry,
    resolver: ManualPathResolver,
}

impl std::fmt::Debug for AppService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppService")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("entries", &self.transcript.len())
            .field("active_streams", &self.streams.active_count())
            .finish()
    }
}

impl AppService {
    /// Create a new engine
    ///
    /// Every transcript append and UI state change is forwarded to `event_tx`.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        source: Arc<dyn StreamSource>,
        prompt: Arc<dyn PathPrompt>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let state = SharedState::new(event_tx.clone());
        let transcript = Transcript::new(event_tx);
        let streams = StreamRegistry::new(source, transcript.clone(), state.clone());
        let resolver = ManualPathResolver::new(
            transport.clone(),
            prompt,
            streams.clone(),
            transcript.clone(),
        );

        Self {
            config,
            transport,
            state,
            transcript,
            streams,
            resolver,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn streams(&self) -> &StreamRegistry {
        &self.streams
    }

    pub fn mode(&self) -> Option<Mode> {
        self.state.mode()
    }

    /// Execute a user command
    ///
    /// Only caller mistakes are returned as `Err` (Allow/Deny without a
    /// pending prompt). Backend failures are recorded in the transcript.
    pub async fn handle_command(&self, command: Command) -> Result<(), OrchestrationError> {
        if let Some((id, text)) = command.button() {
            self.spawn_button_click(id, text);
        }

        match command {
            Command::Quit | Command::Help => {}
            Command::SelectMode(mode) => self.select_mode(mode),
            Command::SendMessage(text) => self.send_free_text(&text).await,
            Command::StartModFix => self.start_modfix().await,
            Command::Allow => self.approve_modfix().await?,
            Command::Deny => self.deny_modfix()?,
            Command::ManualPath => {
                // Already reported in the transcript
                let _ = self.resolve_manual_path().await;
            }
            Command::StopStream => {
                if !self.close_stream(StreamKind::ModFix).await {
                    tracing::debug!("no ModFix stream to stop");
                }
            }
            Command::Cheats => self.fetch_cheats().await,
            Command::HowTo => self.fetch_how_to().await,
            Command::LocateGameFolder => self.locate_game_folder().await,
        }
        Ok(())
    }

    // ========== Backend helpers ==========

    async fn send_raw(
        &self,
        method: Method,
        path: &'static str,
        body: Option<Value>,
    ) -> Result<RawReply, TransportError> {
        self.transport
            .send(method, path, body)
            .instrument(request_span(path))
            .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &'static str,
        body: Option<Value>,
    ) -> Result<T, TransportError> {
        self.send_raw(method, path, body).await?.json()
    }

    // ========== Mode Controller ==========

    /// Switch the interaction mode
    ///
    /// Earlier transcript content is kept; only routing of later messages
    /// changes.
    pub fn select_mode(&self, mode: Mode) {
        tracing::info!(%mode, "mode selected");
        self.state.set_mode(mode);
        self.transcript.system(mode.announcement());
        self.state.mark_active(mode);
    }

    /// Send free text under the current mode
    ///
    /// Blank input is ignored. The "thinking" placeholder stays in the
    /// transcript; the reply is appended after it.
    pub async fn send_free_text(&self, text: &str) {
        let message = text.trim();
        if message.is_empty() {
            return;
        }

        let name = &self.config.assistant_name;
        self.transcript.user(format!("You: {}", message));
        self.transcript.system(format!("{} is thinking...", name));

        let mode = self.state.mode();
        let payload = ChatMessage {
            message: message.to_string(),
            mode,
            timestamp: iso_timestamp(),
            source: self.config.source.clone(),
        };

        let result = async {
            let body = encode_body(&payload)?;
            self.transport
                .request(Method::POST, "/chat", Some(body))
                .await
        }
        .instrument(request_span("/chat"))
        .await;

        match result {
            Ok(value) => {
                let reply: ChatResponse = serde_json::from_value(value).unwrap_or_default();
                let mode_label = non_empty(reply.mode)
                    .unwrap_or_else(|| mode.unwrap_or_default().as_str().to_string());
                let response = non_empty(reply.response).unwrap_or_else(|| NO_RESPONSE.to_string());
                self.transcript
                    .bot(format!("{} ({}): {}", name, mode_label, response));
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                self.transcript.error(CHAT_FAILED);
            }
        }
    }

    // ========== Confirmation Handshake ==========

    async fn modfix_request(&self, permission_granted: bool) -> Result<ModfixReply, TransportError> {
        let body = encode_body(&ModfixRequest { permission_granted })?;
        self.call(Method::POST, "/modfix", Some(body)).await
    }

    /// Advisory step: ask the backend whether consent is needed
    pub async fn start_modfix(&self) {
        self.state.begin_handshake();
        self.transcript.system(MODFIX_PREPARING);

        match self.modfix_request(false).await {
            Ok(reply) => match reply.status() {
                ModfixStatus::Confirm => {
                    tracing::info!("ModFix awaiting consent");
                    self.transcript.bot(reply.text());
                    self.state.show_choices(reply.text());
                }
                ModfixStatus::ManualRequired => {
                    self.state.resolve_handshake();
                    let _ = self.resolver.resolve().await;
                }
                ModfixStatus::Other(status) => {
                    tracing::debug!(?status, "ModFix answered directly");
                    self.state.resolve_handshake();
                    self.transcript
                        .bot(non_empty(reply.response).unwrap_or_else(|| NO_RESPONSE.to_string()));
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "ModFix advisory request failed");
                self.state.resolve_handshake();
                self.transcript.error(format!("⚠️ Error: {}", e));
            }
        }
    }

    /// Consent step: the user allowed the scan
    pub async fn approve_modfix(&self) -> Result<(), OrchestrationError> {
        self.state.allow()?;
        self.transcript.system(MODFIX_GRANTED);

        match self.modfix_request(true).await {
            Ok(reply) if reply.status() == ModfixStatus::ManualRequired => {
                tracing::info!("ModFix needs a manual Mods folder");
                self.state.resolve_handshake();
                let _ = self.resolver.resolve().await;
            }
            Ok(reply) => {
                self.transcript
                    .bot(non_empty(reply.response).unwrap_or_else(|| NO_RESPONSE.to_string()));
                self.streams.open(StreamKind::ModFix).await;
                self.state.resolve_handshake();
            }
            Err(e) => {
                tracing::warn!(error = %e, "ModFix consent request failed");
                self.state.resolve_handshake();
                self.transcript.error(format!("⚠️ Error: {}", e));
            }
        }
        Ok(())
    }

    /// The user denied the scan; nothing is sent to the backend
    pub fn deny_modfix(&self) -> Result<(), OrchestrationError> {
        self.state.deny()?;
        tracing::info!("ModFix scan denied");
        self.transcript.error(MODFIX_DENIED);
        Ok(())
    }

    // ========== Manual path / streams ==========

    /// Ask the operator for the Mods folder and restart the ModFix stream
    pub async fn resolve_manual_path(&self) -> Result<String, OrchestrationError> {
        self.resolver.resolve().await
    }

    /// Explicitly close a progress stream; returns whether one was open
    pub async fn close_stream(&self, kind: StreamKind) -> bool {
        self.streams.close(kind).await
    }

    pub fn is_stream_active(&self, kind: StreamKind) -> bool {
        self.streams.is_active(kind)
    }

    // ========== Read-only flows ==========

    /// List the cheat catalog, one heading per category
    pub async fn fetch_cheats(&self) {
        self.transcript.system(CHEATS_INTRO);

        match self.call::<CheatsReply>(Method::GET, "/cheats", None).await {
            Ok(CheatsReply {
                status: Some(status),
                cheats: Some(catalog),
                ..
            }) if status == "success" && !catalog.is_empty() => {
                for category in catalog.categories {
                    self.transcript.bot(format!("{} Cheats:", category.name));
                    for cheat in category.cheats {
                        self.transcript
                            .bot(format!("{}\n{}", cheat.command, cheat.description));
                    }
                }
            }
            Ok(reply) => {
                tracing::warn!(status = ?reply.status, message = ?reply.message, "no cheats returned");
                self.transcript.error(CHEATS_FAILED);
            }
            Err(e) => {
                tracing::warn!(error = %e, "cheats request failed");
                self.transcript.error(format!("⚠️ Error: {}", e));
            }
        }
    }

    /// Enter How-To mode on the backend
    ///
    /// The only flow that checks the HTTP status itself.
    pub async fn fetch_how_to(&self) {
        self.transcript.system(HOWTO_ENTERING);

        let result = async {
            let body = encode_body(&HowToRequest { mode: Mode::HowTo })?;
            self.send_raw(Method::POST, "/how_to", Some(body)).await
        }
        .await;

        let reply = match result {
            Ok(raw) if !raw.is_success() => {
                tracing::warn!(status = raw.status, "how-to request rejected");
                self.transcript
                    .error(format!("⚠️ Error: Server returned {}", raw.status));
                return;
            }
            Ok(raw) => raw.json::<HowToReply>(),
            Err(e) => Err(e),
        };

        match reply {
            Ok(reply) => {
                let text = non_empty(reply.response).unwrap_or_else(|| HOWTO_READY.to_string());
                self.transcript.bot(format!("How-To: {}", text));
            }
            Err(e) => {
                tracing::warn!(error = %e, "how-to request failed");
                self.transcript.error(format!("⚠️ Error: {}", e));
            }
        }
    }

    /// Ask the backend to search for the EA folder again
    pub async fn locate_game_folder(&self) {
        match self.call::<LocateReply>(Method::POST, "/locate_ea", None).await {
            Ok(reply) if reply.status.as_deref() == Some("success") => {
                self.transcript.bot(
                    non_empty(reply.message).unwrap_or_else(|| "EA folder found.".to_string()),
                );
            }
            Ok(reply) => {
                self.transcript.error(format!(
                    "❌ {}",
                    non_empty(reply.message)
                        .unwrap_or_else(|| "Could not locate the EA folder.".to_string())
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "locate request failed");
                self.transcript.error(format!("⚠️ Error: {}", e));
            }
        }
    }

    // ========== Telemetry ==========

    /// Report a button press; the outcome never affects the session
    pub async fn log_button_click(&self, id: Option<String>, text: String) {
        let event = ButtonClickEvent {
            id,
            text,
            timestamp: iso_timestamp(),
        };
        let result = async {
            let body = encode_body(&event)?;
            self.send_raw(Method::POST, "/log_button_click", Some(body))
                .await
        }
        .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to log button click");
        }
    }

    /// Fire-and-forget variant of [`Self::log_button_click`]
    pub fn spawn_button_click(&self, id: String, text: String) {
        let svc = self.clone();
        tokio::spawn(async move {
            svc.log_button_click(Some(id), text).await;
        });
    }
}
