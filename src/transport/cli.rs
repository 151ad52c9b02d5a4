//! CLI transport for direct terminal interaction
//!
//! Line-oriented frontend: slash commands in, coloured transcript out.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use tokio::sync::{mpsc, Mutex};

use super::http::HttpTransport;
use crate::config::Config;
use crate::core::{Mode, PathPrompt};
use crate::ui_backend::{
    AppEvent, AppService, Command, EntryKind, OrchestrationError, StreamKind, UiRenderer,
};

/// Lines typed by the operator
///
/// A single reader thread owns stdin; the REPL and the path prompt take turns
/// pulling lines from it, so input is never split between two readers.
#[derive(Clone)]
pub struct LineInput {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
}

impl LineInput {
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        // Plain thread: a blocking read must not hold up runtime shutdown
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self::from_receiver(rx)
    }

    pub fn from_receiver(rx: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Next line, or `None` at end of input
    pub async fn next_line(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }
}

/// Path prompt answered from the terminal
pub struct TerminalPathPrompt {
    input: LineInput,
}

impl TerminalPathPrompt {
    pub fn new(input: LineInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl PathPrompt for TerminalPathPrompt {
    async fn ask(&self, message: &str) -> Option<String> {
        println!("{}", message.yellow().bold());
        print!("path> ");
        let _ = io::stdout().flush();
        self.input.next_line().await
    }
}

/// Prompt for one-shot commands, which never ask for input
pub struct NoPrompt;

#[async_trait]
impl PathPrompt for NoPrompt {
    async fn ask(&self, _message: &str) -> Option<String> {
        None
    }
}

/// Renders engine events as coloured lines
pub struct TerminalRenderer<W: Write> {
    out: W,
    active_mode: Option<Mode>,
    choices_visible: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            active_mode: None,
            choices_visible: false,
        }
    }

    pub fn active_mode(&self) -> Option<Mode> {
        self.active_mode
    }

    pub fn choices_visible(&self) -> bool {
        self.choices_visible
    }
}

impl<W: Write> UiRenderer for TerminalRenderer<W> {
    fn render(&mut self, event: &AppEvent) -> Result<()> {
        match event {
            AppEvent::EntryAppended(entry) => {
                let text = match entry.kind {
                    EntryKind::System => entry.text.dimmed(),
                    EntryKind::User => entry.text.cyan().bold(),
                    EntryKind::Bot => entry.text.green(),
                    EntryKind::Error => entry.text.red(),
                };
                writeln!(self.out, "{}", text)?;
            }
            AppEvent::ModeChanged { mode, .. } => {
                self.active_mode = Some(*mode);
                writeln!(self.out, "{}", format!("[mode: {}]", mode).magenta())?;
            }
            AppEvent::ChoicesShown(card) => {
                self.choices_visible = true;
                let buttons: Vec<String> = card
                    .choices()
                    .iter()
                    .map(|c| format!("[{}] /{}", c.label(), c.id().trim_end_matches("-scan")))
                    .collect();
                writeln!(self.out, "  {}", buttons.join("   ").bold())?;
            }
            AppEvent::ChoicesRemoved => {
                self.choices_visible = false;
            }
            AppEvent::StreamOpened(kind) => {
                writeln!(
                    self.out,
                    "{}",
                    format!("── {} live (/stop to end) ──", kind.label()).dimmed()
                )?;
            }
            AppEvent::StreamClosed(kind) => {
                tracing::debug!(stream = kind.label(), "stream released");
            }
            AppEvent::ManualPathRequested => {}
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Build the engine against the configured backend
pub fn build_service(
    config: &Config,
    prompt: Arc<dyn PathPrompt>,
) -> Result<(AppService, mpsc::UnboundedReceiver<AppEvent>)> {
    let transport = Arc::new(
        HttpTransport::new(&config.backend)
            .with_context(|| format!("Invalid backend URL {}", config.backend.base_url))?,
    );
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let service = AppService::new(
        config.client.clone(),
        transport.clone(),
        transport,
        prompt,
        event_tx,
    );
    Ok((service, event_rx))
}

/// Print events until every sender is gone
async fn drain_events(mut events: mpsc::UnboundedReceiver<AppEvent>) -> Result<()> {
    let mut renderer = TerminalRenderer::new(io::stdout());
    while let Some(event) = events.recv().await {
        renderer.render(&event)?;
    }
    Ok(())
}

/// Run interactive chat mode
pub async fn run_chat(config: Config) -> Result<()> {
    let input = LineInput::stdin();
    let prompt = Arc::new(TerminalPathPrompt::new(input.clone()));
    let (service, mut events) = build_service(&config, prompt)?;

    println!("{}", "SimSanity".bold().green());
    println!("Backend: {}", config.backend.base_url);
    println!("Type /help for commands, /quit to exit\n");

    let (manual_tx, mut manual_rx) = mpsc::unbounded_channel::<()>();
    let render_task = tokio::spawn(async move {
        let mut renderer = TerminalRenderer::new(io::stdout());
        while let Some(event) = events.recv().await {
            if matches!(event, AppEvent::ManualPathRequested) {
                let _ = manual_tx.send(());
            }
            if let Err(e) = renderer.render(&event) {
                tracing::warn!(error = %e, "failed to render event");
            }
        }
    });

    loop {
        print!("> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            line = input.next_line() => line,
            Some(()) = manual_rx.recv() => {
                println!();
                // Outcome is already in the transcript
                let _ = service.resolve_manual_path().await;
                continue;
            }
        };

        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::from_input(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{}", message.red());
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => {
                for help in Command::help_lines() {
                    println!("  {}", help);
                }
                continue;
            }
            _ => {}
        }

        match service.handle_command(command).await {
            Ok(()) => {}
            Err(OrchestrationError::NoPendingConfirmation) => {
                eprintln!("{}", "Nothing to allow or deny. Start with /modfix.".yellow());
            }
            Err(e) if e.is_silent() => {}
            Err(e) => eprintln!("{}", e.to_string().red()),
        }
        // Let the renderer catch up before the next prompt
        tokio::task::yield_now().await;
    }

    service.close_stream(StreamKind::ModFix).await;
    drop(service);
    let _ = tokio::time::timeout(Duration::from_millis(500), render_task).await;
    println!("Goodbye!");
    Ok(())
}

/// Fetch and print the cheat catalog
pub async fn run_cheats(config: Config) -> Result<()> {
    let (service, events) = build_service(&config, Arc::new(NoPrompt))?;
    service.fetch_cheats().await;
    drop(service);
    drain_events(events).await
}

/// Enter How-To mode once and print the answer
pub async fn run_howto(config: Config) -> Result<()> {
    let (service, events) = build_service(&config, Arc::new(NoPrompt))?;
    service.fetch_how_to().await;
    drop(service);
    drain_events(events).await
}

/// Write a default config file unless one already exists
pub fn run_config_init() -> Result<()> {
    let path = Config::config_path()?;
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    let path = Config::default().save()?;
    println!("{} Wrote default config to {}", "✓".green(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui_backend::{ChoiceCard, Transcript};

    fn render_to_string(events: &[AppEvent]) -> (String, TerminalRenderer<Vec<u8>>) {
        colored::control::set_override(false);
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render_all(events).unwrap();
        let out = String::from_utf8(renderer.out.clone()).unwrap();
        (out, renderer)
    }

    #[test]
    fn test_renders_entries_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transcript = Transcript::new(tx);
        transcript.user("You: hi");
        transcript.bot("simsanity (none): hello");

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        let (out, _) = render_to_string(&events);
        assert_eq!(out, "You: hi\nsimsanity (none): hello\n");
    }

    #[test]
    fn test_tracks_mode_and_choices() {
        let events = vec![
            AppEvent::ModeChanged {
                mode: Mode::ModFix,
                button_id: "btn-modfix".to_string(),
            },
            AppEvent::ChoicesShown(ChoiceCard::new("Proceed?")),
        ];
        let (out, renderer) = render_to_string(&events);
        assert!(out.contains("[mode: modfix]"));
        assert!(out.contains("/allow"));
        assert!(out.contains("/deny"));
        assert_eq!(renderer.active_mode(), Some(Mode::ModFix));
        assert!(renderer.choices_visible());

        let mut renderer = renderer;
        renderer.render(&AppEvent::ChoicesRemoved).unwrap();
        assert!(!renderer.choices_visible());
    }

    #[tokio::test]
    async fn test_line_input_hands_out_lines_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        let input = LineInput::from_receiver(rx);
        tx.send("first".to_string()).unwrap();
        tx.send("second".to_string()).unwrap();
        drop(tx);

        let prompt = TerminalPathPrompt::new(input.clone());
        assert_eq!(input.next_line().await.as_deref(), Some("first"));
        assert_eq!(prompt.ask("where?").await.as_deref(), Some("second"));
        assert_eq!(input.next_line().await, None);
    }

    #[tokio::test]
    async fn test_one_shot_prompt_dismisses_without_reading() {
        assert_eq!(NoPrompt.ask("where?").await, None);
    }
}
