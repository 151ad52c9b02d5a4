//! Transport layer
//!
//! - `http` - request/response exchanges with the backend over reqwest
//! - `sse` - `text/event-stream` decoding and the streaming source
//! - `cli` - line-oriented terminal frontend

pub mod cli;
pub mod http;
pub mod sse;

pub use http::HttpTransport;
pub use sse::{decode_events, SseDecoder};
