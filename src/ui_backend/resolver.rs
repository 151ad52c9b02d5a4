//! Manual-Path Resolver
//!
//! Recovery path for when the backend cannot find the Mods folder on its
//! own: ask the operator, hand the path to the backend, restart the stream.

use std::sync::Arc;

use reqwest::Method;

use super::errors::OrchestrationError;
use super::streams::{StreamKind, StreamRegistry};
use super::transcript::Transcript;
use crate::core::{encode_body, ManualPathReply, ManualPathRequest, PathPrompt, Transport};

pub const PATH_PROMPT: &str =
    "Could not find your Mods folder automatically.\nPaste or drag it here:";

#[derive(Clone)]
pub struct ManualPathResolver {
    transport: Arc<dyn Transport>,
    prompt: Arc<dyn PathPrompt>,
    streams: StreamRegistry,
    transcript: Transcript,
}

impl ManualPathResolver {
    pub fn new(
        transport: Arc<dyn Transport>,
        prompt: Arc<dyn PathPrompt>,
        streams: StreamRegistry,
        transcript: Transcript,
    ) -> Self {
        Self {
            transport,
            prompt,
            streams,
            transcript,
        }
    }

    /// Ask for a path, submit it and restart the ModFix stream
    ///
    /// Returns the path now in use. On failure the problem has already been
    /// appended to the transcript, except for `UserCancelled`, which leaves
    /// no trace at all.
    pub async fn resolve(&self) -> Result<String, OrchestrationError> {
        let result = self.try_resolve().await;
        match &result {
            Ok(path) => tracing::info!(%path, "manual Mods folder accepted"),
            Err(OrchestrationError::UserCancelled) => {
                tracing::debug!("manual path prompt dismissed")
            }
            Err(OrchestrationError::Protocol { message, .. }) => {
                tracing::warn!(?message, "manual Mods folder rejected");
                let message = message.as_deref().filter(|m| !m.trim().is_empty());
                self.transcript.error(format!(
                    "❌ {}",
                    message.unwrap_or("Invalid path response.")
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "manual path submission failed");
                self.transcript
                    .error(format!("⚠️ Error setting path: {}", e));
            }
        }
        result
    }

    async fn try_resolve(&self) -> Result<String, OrchestrationError> {
        let path = self
            .prompt
            .ask(PATH_PROMPT)
            .await
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or(OrchestrationError::UserCancelled)?;

        self.transcript.system("📁 Setting manual Mods folder...");

        let body = encode_body(&ManualPathRequest { path: path.clone() })?;
        let reply: ManualPathReply = self
            .transport
            .send(Method::POST, "/manual_mods_path", Some(body))
            .await?
            .json()?;

        if !reply.is_accepted() {
            return Err(OrchestrationError::Protocol {
                status: reply.status,
                message: reply.message,
            });
        }

        // The backend may omit `path`; fall back to what the operator typed
        let used = reply.path.filter(|p| !p.is_empty()).unwrap_or(path);
        self.transcript.bot(format!("✅ Using Mods folder: {}", used));
        self.transcript
            .system("🔁 Restarting ModFix with your selected folder...");

        self.streams.open(StreamKind::ModFix).await;
        Ok(used)
    }
}
