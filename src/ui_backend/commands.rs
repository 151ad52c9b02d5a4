//! User Commands
//!
//! Every action a frontend can trigger, plus the slash-command syntax the
//! terminal frontend uses to produce them.

use super::approval::Choice;
use crate::core::Mode;

/// User commands that can be executed
///
/// These represent button presses and text submissions. `AppService`
/// handles them and records the effects in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ========== Application Control ==========
    /// Quit the application
    Quit,

    /// Show the command list
    Help,

    // ========== Mode ==========
    /// Select the interaction mode
    SelectMode(Mode),

    // ========== Message Input ==========
    /// Send free text to the backend under the current mode
    SendMessage(String),

    // ========== ModFix ==========
    /// Start the ModFix consent handshake
    StartModFix,

    /// Allow the pending scan
    Allow,

    /// Deny the pending scan
    Deny,

    /// Supply the Mods folder by hand
    ManualPath,

    /// Close the live progress stream
    StopStream,

    // ========== Read-only flows ==========
    /// List cheat codes
    Cheats,

    /// Enter How-To mode
    HowTo,

    /// Ask the backend to look for the EA folder again
    LocateGameFolder,
}

impl Command {
    /// Parse a line of terminal input
    ///
    /// Lines that do not start with `/` are free text. Returns `Err` with a
    /// message for unknown or malformed slash commands.
    pub fn from_input(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::SendMessage(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_lowercase().as_str() {
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "help" | "?" => Ok(Command::Help),
            "mode" if arg.is_empty() => Err("Usage: /mode <name>".to_string()),
            "mode" => Ok(Command::SelectMode(Mode::from(arg))),
            "modfix" => Ok(Command::StartModFix),
            "allow" | "yes" => Ok(Command::Allow),
            "deny" | "no" => Ok(Command::Deny),
            "path" => Ok(Command::ManualPath),
            "stop" => Ok(Command::StopStream),
            "cheats" => Ok(Command::Cheats),
            "howto" | "how_to" => Ok(Command::HowTo),
            "locate" => Ok(Command::LocateGameFolder),
            other => Err(format!("Unknown command: /{}", other)),
        }
    }

    /// Button this command stands for, as `(id, text)` for click telemetry
    pub fn button(&self) -> Option<(String, String)> {
        let (id, text) = match self {
            Command::SelectMode(mode) => (mode.button_id(), mode.as_str().to_string()),
            Command::StartModFix => ("btn-modfix".to_string(), "ModFix".to_string()),
            Command::Allow => (Choice::Allow.id().to_string(), Choice::Allow.label().to_string()),
            Command::Deny => (Choice::Deny.id().to_string(), Choice::Deny.label().to_string()),
            Command::Cheats => ("btn-cheats".to_string(), "Cheats".to_string()),
            Command::HowTo => ("btn-howto".to_string(), "How-To".to_string()),
            _ => return None,
        };
        Some((id, text))
    }

    /// One-line reference for every slash command
    pub fn help_lines() -> &'static [&'static str] {
        &[
            "/mode <modfix|howto|cheats|organize_mods|read_save|none>  switch mode",
            "/modfix    start ModFix (asks before scanning)",
            "/allow     allow the pending scan",
            "/deny      deny the pending scan",
            "/path      enter the Mods folder by hand",
            "/stop      stop the live ModFix stream",
            "/cheats    list cheat codes",
            "/howto     enter How-To mode",
            "/locate    search for the EA folder again",
            "/quit      exit",
            "anything else is sent as a message",
        ]
    }
}
