//! Server-Sent Events consumer
//!
//! Decodes `text/event-stream` bodies into one text payload per event and
//! exposes them through the [`StreamSource`] seam.

use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};

use super::http::HttpTransport;
use crate::core::{EventStream, StreamSource, TransportError};

/// Server-Sent Events (SSE) decoder
///
/// Buffers incoming bytes and emits the joined `data:` payload of every
/// complete event. An event ends at a blank line; several `data:` lines in
/// one event are joined with `\n`. Comment lines and other fields are
/// skipped.
///
/// Bytes are buffered undecoded until a full line is available, so multibyte
/// characters split across network chunks survive intact.
///
/// # Example
/// ```
/// use simsanity_cli::transport::SseDecoder;
///
/// let mut decoder = SseDecoder::new();
/// assert!(decoder.push("data: 🧩 Start".as_bytes()).is_empty());
/// assert_eq!(decoder.push(b"ing ModFix...\n\n"), vec!["🧩 Starting ModFix..."]);
///
/// decoder.push(b"data: done");
/// assert_eq!(decoder.finish(), vec!["done"]);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push incoming bytes and return every event completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            self.process_line(line.trim_end_matches('\r'), &mut events);
        }
        events
    }

    /// Flush at end of stream
    ///
    /// A trailing line without newline and a final event without the blank
    /// separator are both delivered.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = String::from_utf8_lossy(&rest);
            for line in rest.lines() {
                self.process_line(line, &mut events);
            }
        }
        self.dispatch(&mut events);
        events
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
    }

    fn dispatch(&mut self, events: &mut Vec<String>) {
        if !self.data.is_empty() {
            events.push(self.data.join("\n"));
            self.data.clear();
        }
    }
}

struct DecodeState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

/// Turn a raw byte stream into an [`EventStream`]
///
/// A body error is yielded once as `Err` and ends the stream.
pub fn decode_events<S, B>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, TransportError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.pending.pop_front() {
                return Some((Ok(event), st));
            }
            if st.done {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => st.pending.extend(st.decoder.push(chunk.as_ref())),
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.done = true;
                    st.pending.extend(st.decoder.finish());
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl StreamSource for HttpTransport {
    async fn open(&self, path: &str) -> Result<EventStream, TransportError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "opening event stream");

        let response = self
            .stream_client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(TransportError::from_network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::StreamRejected(status.as_u16()));
        }

        Ok(decode_events(
            response
                .bytes_stream()
                .map_err(TransportError::from_network_error),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: Scanning Mods...\n\n");
        assert_eq!(events, vec!["Scanning Mods..."]);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: one\n\ndata: two\n\n");
        assert_eq!(events, vec!["one", "two"]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: hel").is_empty());
        assert!(decoder.push(b"lo\n").is_empty());
        assert_eq!(decoder.push(b"\n"), vec!["hello"]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let bytes = "data: ✅ done\n\n".as_bytes();
        // Split inside the three-byte check mark
        let (a, b) = bytes.split_at(7);
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(a).is_empty());
        assert_eq!(decoder.push(b), vec!["✅ done"]);
    }

    #[test]
    fn test_multiline_data_joined() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: line one\ndata: line two\n\n");
        assert_eq!(events, vec!["line one\nline two"]);
    }

    #[test]
    fn test_comments_and_other_fields_ignored() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\nevent: progress\nid: 7\ndata: x\n\n");
        assert_eq!(events, vec!["x"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: a\r\n\r\ndata: b\r\n\r\n");
        assert_eq!(events, vec!["a", "b"]);
    }

    #[test]
    fn test_json_payload_passes_through() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"status\": \"manual_required\"}\n\n");
        assert_eq!(events, vec!["{\"status\": \"manual_required\"}"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.push(b"data: a\n\ndata: b"), vec!["a"]);
        assert_eq!(decoder.finish(), vec!["b"]);
        assert!(decoder.finish().is_empty());
    }

    #[tokio::test]
    async fn test_decode_events_yields_in_order_then_ends() {
        let chunks: Vec<Result<Vec<u8>, TransportError>> = vec![
            Ok(b"data: first\n\ndata: sec".to_vec()),
            Ok(b"ond\n\ndata: third".to_vec()),
        ];
        let events: Vec<_> = decode_events(futures::stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(events, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_decode_events_surfaces_body_error_once() {
        let chunks: Vec<Result<Vec<u8>, TransportError>> = vec![
            Ok(b"data: ok\n\n".to_vec()),
            Err(TransportError::Network("reset".to_string())),
            Ok(b"data: never\n\n".to_vec()),
        ];
        let items: Vec<_> = decode_events(futures::stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "ok");
        assert!(matches!(items[1], Err(TransportError::Network(_))));
    }
}
