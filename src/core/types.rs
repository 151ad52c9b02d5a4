//! Canonical type definitions for the core domain
//!
//! Wire payloads exchanged with the backend plus the interaction [`Mode`].
//! Everything that crosses the HTTP boundary is defined here so the
//! transport and ui_backend layers never drift apart.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Conversational intent category that governs request routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// No specific intent selected
    #[default]
    #[serde(rename = "none")]
    None,
    /// Scan, clean and repair the Mods folder
    #[serde(rename = "modfix")]
    ModFix,
    /// Step-by-step help
    #[serde(rename = "howto")]
    HowTo,
    /// Cheat code lookup
    #[serde(rename = "cheats")]
    Cheats,
    /// Sort and tidy installed mods
    #[serde(rename = "organize_mods")]
    OrganizeMods,
    /// Inspect a save file
    #[serde(rename = "read_save")]
    ReadSave,
}

impl Mode {
    /// All modes in the order the frontend lists them
    pub fn all() -> &'static [Mode] {
        &[
            Mode::ModFix,
            Mode::HowTo,
            Mode::Cheats,
            Mode::OrganizeMods,
            Mode::ReadSave,
            Mode::None,
        ]
    }

    /// Wire name, as sent in the `mode` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ModFix => "modfix",
            Self::HowTo => "howto",
            Self::Cheats => "cheats",
            Self::OrganizeMods => "organize_mods",
            Self::ReadSave => "read_save",
        }
    }

    /// System announcement appended when the mode is selected
    pub fn announcement(&self) -> &'static str {
        match self {
            Self::ModFix => "🛠️ ModFix Initializing",
            Self::HowTo => "📘 How-To mode active — ask what you’d like to learn or fix.",
            Self::Cheats => "🎮 Cheats ready — ask for a category (money, needs, skills, etc.).",
            Self::OrganizeMods => {
                "📂 Mod Organizer active — drop your Mods folder or request cleanup."
            }
            Self::ReadSave => "💾 Save Reader active — upload or specify the save file to analyze.",
            Self::None => "⚙️ Default mode — describe what you need help with.",
        }
    }

    /// Identifier of the UI affordance that is marked active for this mode
    pub fn button_id(&self) -> String {
        format!("btn-{}", self.as_str())
    }
}

impl From<&str> for Mode {
    /// Unknown names fall back to [`Mode::None`]
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "modfix" => Self::ModFix,
            "howto" | "how_to" => Self::HowTo,
            "cheats" => Self::Cheats,
            "organize_mods" | "organize" => Self::OrganizeMods,
            "read_save" | "save" => Self::ReadSave,
            _ => Self::None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current time as an ISO-8601 string with millisecond precision (`...Z`)
pub fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ========== Outgoing payloads ==========

/// Free-text message posted to `/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub message: String,
    /// `null` until a mode has been selected
    pub mode: Option<Mode>,
    pub timestamp: String,
    /// Fixed tag identifying this client
    pub source: String,
}

/// Body of both `/modfix` requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModfixRequest {
    pub permission_granted: bool,
}

/// Operator-supplied Mods folder posted to `/manual_mods_path`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualPathRequest {
    pub path: String,
}

/// Body of `/how_to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HowToRequest {
    pub mode: Mode,
}

/// Telemetry record posted to `/log_button_click`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonClickEvent {
    pub id: Option<String>,
    pub text: String,
    pub timestamp: String,
}

// ========== Incoming payloads ==========

/// Reply from `/chat`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatResponse {
    /// Mode echoed by the backend; may differ from the request
    pub mode: Option<String>,
    pub response: Option<String>,
}

/// Outcome carried in the `status` field of a `/modfix` reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModfixStatus {
    /// Backend wants explicit consent before scanning
    Confirm,
    /// Automatic discovery failed; a path must be supplied by hand
    ManualRequired,
    /// Anything else, including a missing status
    Other(Option<String>),
}

/// Reply from `/modfix`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModfixReply {
    pub status: Option<String>,
    pub response: Option<String>,
}

impl ModfixReply {
    pub fn status(&self) -> ModfixStatus {
        match self.status.as_deref() {
            Some("confirm") => ModfixStatus::Confirm,
            Some("manual_required") => ModfixStatus::ManualRequired,
            other => ModfixStatus::Other(other.map(str::to_string)),
        }
    }

    /// Response text, or empty when the backend sent none
    pub fn text(&self) -> &str {
        self.response.as_deref().unwrap_or_default()
    }
}

/// Reply from `/manual_mods_path`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManualPathReply {
    pub status: Option<String>,
    pub path: Option<String>,
    pub message: Option<String>,
}

impl ManualPathReply {
    /// Both `success` and `manual_path_received` mean the folder was accepted
    pub fn is_accepted(&self) -> bool {
        matches!(
            self.status.as_deref(),
            Some("success") | Some("manual_path_received")
        )
    }
}

/// A single cheat console command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheatEntry {
    pub command: String,
    pub description: String,
}

/// Cheats grouped by category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheatCategory {
    pub name: String,
    pub cheats: Vec<CheatEntry>,
}

/// Read-only snapshot of the cheat catalog, in backend order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheatCatalog {
    pub categories: Vec<CheatCategory>,
}

impl CheatCatalog {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl<'de> Deserialize<'de> for CheatCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = CheatCatalog;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category name to a list of cheats")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut categories = Vec::new();
                while let Some((name, cheats)) = map.next_entry::<String, Vec<CheatEntry>>()? {
                    categories.push(CheatCategory { name, cheats });
                }
                Ok(CheatCatalog { categories })
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

/// Reply from `GET /cheats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheatsReply {
    pub status: Option<String>,
    pub cheats: Option<CheatCatalog>,
    pub message: Option<String>,
}

/// Reply from `/how_to`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HowToReply {
    pub response: Option<String>,
}

/// Reply from `/locate_ea`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LocateReply {
    pub status: Option<String>,
    pub message: Option<String>,
}
