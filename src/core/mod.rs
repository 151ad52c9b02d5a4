//! Core domain modules
//!
//! Types and seams shared by the transport implementations and the
//! ui_backend orchestration layer.

pub mod errors;
pub mod traits;
pub mod types;

pub use errors::TransportError;
pub use traits::{encode_body, EventStream, PathPrompt, RawReply, StreamSource, Transport};
pub use types::{
    iso_timestamp, ButtonClickEvent, ChatMessage, ChatResponse, CheatCatalog, CheatCategory,
    CheatEntry, CheatsReply, HowToReply, HowToRequest, LocateReply, ManualPathReply,
    ManualPathRequest, Mode, ModfixReply, ModfixRequest, ModfixStatus,
};
