//! simsanity: terminal client for the SimSanity Sims 4 assistant
//!
//! This library provides:
//! - Mode-scoped chat with the SimSanity backend
//! - The ModFix consent handshake with live progress streaming
//! - Manual Mods folder recovery when automatic discovery fails
//! - Cheat catalog and How-To lookups
//!
//! The orchestration engine ([`ui_backend::AppService`]) only talks to the
//! backend through the [`core::Transport`] and [`core::StreamSource`] seams,
//! so it can run against the reqwest implementations or in-memory fakes.

pub mod config;
pub mod core;
pub mod transport;
pub mod ui_backend;

pub use config::Config;
pub use transport::HttpTransport;
pub use ui_backend::{AppEvent, AppService, Command};
