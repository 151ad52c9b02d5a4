//! HTTP client for the simsanity backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::config::BackendConfig;
use crate::core::{RawReply, Transport, TransportError};

/// reqwest-backed adapter for request/response exchanges and event streams
///
/// Two clients are kept: one with a total request timeout for ordinary
/// exchanges, and one with only a connect timeout, since a progress stream
/// stays open for as long as the backend keeps sending.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    client: reqwest::Client,
    pub(super) stream_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &BackendConfig) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(&config.base_url)?;
        // Url::join replaces the last path segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(TransportError::from_network_error)?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(TransportError::from_network_error)?;

        Ok(Self {
            base_url,
            client,
            stream_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path such as `/modfix/stream` against the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<RawReply, TransportError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "backend request");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(TransportError::from_network_error)?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        tracing::debug!(status, bytes = text.len(), "backend reply");
        Ok(RawReply::new(status, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(&BackendConfig {
            base_url: base_url.to_string(),
            ..BackendConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_onto_root() {
        let t = transport("http://127.0.0.1:5000");
        assert_eq!(
            t.endpoint("/modfix/stream").unwrap().as_str(),
            "http://127.0.0.1:5000/modfix/stream"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let t = transport("http://localhost:8080/simsanity");
        assert_eq!(t.base_url().as_str(), "http://localhost:8080/simsanity/");
        assert_eq!(
            t.endpoint("/chat").unwrap().as_str(),
            "http://localhost:8080/simsanity/chat"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = HttpTransport::new(&BackendConfig {
            base_url: "::not a url".to_string(),
            ..BackendConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }
}
