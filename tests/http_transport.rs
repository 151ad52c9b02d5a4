//! reqwest transport against a mock backend

use std::sync::Arc;

use futures::StreamExt;
use reqwest::Method;
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use simsanity_cli::config::{BackendConfig, ClientConfig};
use simsanity_cli::core::{
    EventStream, PathPrompt, StreamSource, Transport, TransportError,
};
use simsanity_cli::transport::HttpTransport;
use simsanity_cli::ui_backend::{AppService, EntryKind, StreamKind, STREAM_ENDED};

fn transport_for(base_url: &str) -> HttpTransport {
    HttpTransport::new(&BackendConfig {
        base_url: base_url.to_string(),
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
    })
    .unwrap()
}

fn expect_open_error(result: Result<EventStream, TransportError>) -> TransportError {
    match result {
        Ok(_) => panic!("stream unexpectedly opened"),
        Err(e) => e,
    }
}

#[tokio::test]
async fn test_post_sends_json_and_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/modfix"))
        .and(body_json(json!({"permission_granted": false})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "confirm", "response": "Proceed?"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server.uri());
    let reply = transport
        .request(
            Method::POST,
            "/modfix",
            Some(json!({"permission_granted": false})),
        )
        .await
        .unwrap();

    assert_eq!(reply["status"], "confirm");
}

#[tokio::test]
async fn test_body_parsed_regardless_of_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/manual_mods_path"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"status": "error", "message": "Folder does not exist."})),
        )
        .mount(&server)
        .await;

    let transport = transport_for(&server.uri());
    let raw = transport
        .send(Method::POST, "/manual_mods_path", Some(json!({"path": "/x"})))
        .await
        .unwrap();

    assert_eq!(raw.status, 400);
    assert!(!raw.is_success());
    let value: serde_json::Value = raw.json().unwrap();
    assert_eq!(value["message"], "Folder does not exist.");
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cheats"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let transport = transport_for(&server.uri());
    let err = transport
        .request(Method::GET, "/cheats", None)
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Malformed { status: 502, .. }));
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "hi"})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&format!("{}/api", server.uri()));
    let reply = transport
        .request(Method::POST, "/chat", Some(json!({"message": "hello"})))
        .await
        .unwrap();

    assert_eq!(reply["response"], "hi");
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let transport = transport_for("http://127.0.0.1:9");
    let err = transport
        .request(Method::GET, "/cheats", None)
        .await
        .unwrap_err();

    assert!(err.is_network());
}

#[tokio::test]
async fn test_stream_yields_events_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/modfix/stream"))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(
                    ": keep-alive\n\ndata: 🔍 Scanning...\n\ndata: line one\ndata: line two\n\ndata: Done\n\n",
                ),
        )
        .mount(&server)
        .await;

    let transport = transport_for(&server.uri());
    let events: Vec<_> = transport
        .open("/modfix/stream")
        .await
        .unwrap()
        .collect()
        .await;

    let events: Vec<String> = events.into_iter().map(Result::unwrap).collect();
    assert_eq!(events, vec!["🔍 Scanning...", "line one\nline two", "Done"]);
}

#[tokio::test]
async fn test_stream_rejected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/modfix/stream"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let transport = transport_for(&server.uri());
    let err = expect_open_error(transport.open("/modfix/stream").await);

    assert!(matches!(err, TransportError::StreamRejected(404)));
}

struct NoPrompt;

#[async_trait::async_trait]
impl PathPrompt for NoPrompt {
    async fn ask(&self, _message: &str) -> Option<String> {
        None
    }
}

#[tokio::test]
async fn test_consent_flow_streams_progress_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/modfix"))
        .and(body_json(json!({"permission_granted": false})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "confirm", "response": "Scan your Mods folder?"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/modfix"))
        .and(body_json(json!({"permission_granted": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "started", "response": "🔍 Scanning..."})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/modfix/stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string("data: Found 2 broken mods\n\ndata: ✅ ModFix complete\n\n"),
        )
        .mount(&server)
        .await;

    let transport = Arc::new(transport_for(&server.uri()));
    let (tx, _rx) = mpsc::unbounded_channel();
    let service = AppService::new(
        ClientConfig::default(),
        transport.clone(),
        transport,
        Arc::new(NoPrompt),
        tx,
    );

    service.start_modfix().await;
    assert!(service.state().pending_choices().is_some());
    service.approve_modfix().await.unwrap();

    // The mock closes the stream after the body, which is terminal
    for _ in 0..100 {
        if !service.is_stream_active(StreamKind::ModFix) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let texts: Vec<_> = service
        .transcript()
        .entries()
        .into_iter()
        .filter(|e| e.kind != EntryKind::System)
        .map(|e| e.text)
        .collect();
    assert_eq!(
        texts,
        vec![
            "Scan your Mods folder?",
            "🔍 Scanning...",
            "Found 2 broken mods",
            "✅ ModFix complete",
            STREAM_ENDED,
        ]
    );
}
