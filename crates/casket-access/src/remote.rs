//! HTTP range access to CDN documents

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::RANGE;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::{debug, trace};

use crate::error::{AccessError, Result};
use crate::location::{ByteRange, ByteReader, DataLocation};
use crate::provider::DataAccessProvider;

/// HTTP client settings for remote access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 45,
            connect_timeout_secs: 10,
            user_agent: concat!("casket/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl RemoteConfig {
    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Set the connection timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = timeout.as_secs();
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn client_builder(&self) -> ClientBuilder {
        ClientBuilder::new()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .redirect(reqwest::redirect::Policy::limited(3))
            .user_agent(self.user_agent.clone())
    }
}

/// Reads ranges of CDN documents with `Range` requests
#[derive(Debug, Clone)]
pub struct RemoteProvider {
    client: Client,
}

impl RemoteProvider {
    /// Create a provider from client settings
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        install_crypto_provider();
        Ok(Self {
            client: config.client_builder().build()?,
        })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Install the ring provider for rustls; a provider installed earlier is kept
fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

#[async_trait]
impl DataAccessProvider for RemoteProvider {
    async fn open(&self, location: &DataLocation, range: ByteRange) -> Result<ByteReader> {
        let DataLocation::Url(url) = location else {
            return Err(AccessError::UnsupportedLocation(location.to_string()));
        };
        if range.is_empty() {
            return Ok(Box::pin(tokio::io::empty()));
        }

        let mut request = self.client.get(url.clone());
        if let Some(value) = range.header_value() {
            request = request.header(RANGE, value);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "transfer failed");
            return Err(AccessError::Transfer {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        trace!(%url, %range, %status, "streaming response");

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let mut reader: ByteReader = Box::pin(StreamReader::new(stream));

        // A server that ignores the Range header sends the whole document
        if status == StatusCode::PARTIAL_CONTENT || range.is_full() {
            return Ok(reader);
        }
        debug!(%url, %range, "range ignored by server, slicing body");
        tokio::io::copy(&mut (&mut reader).take(range.offset), &mut tokio::io::sink()).await?;
        Ok(match range.length {
            Some(length) => Box::pin(reader.take(length)),
            None => reader,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn location(server: &MockServer, p: &str) -> DataLocation {
        DataLocation::Url(format!("{}{p}", server.uri()).parse().unwrap())
    }

    fn provider() -> RemoteProvider {
        RemoteProvider::new(&RemoteConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_sends_range_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/ab/cd/abcd"))
            .and(header("range", "bytes=4-7"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(b"4567".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let data = provider()
            .read(&location(&server, "/data/ab/cd/abcd"), ByteRange::new(4, 4))
            .await
            .unwrap();
        assert_eq!(data, b"4567");
    }

    #[tokio::test]
    async fn test_slices_when_range_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"0123456789".to_vec()))
            .mount(&server)
            .await;

        let provider = provider();
        let doc = location(&server, "/doc");
        assert_eq!(provider.read(&doc, ByteRange::new(2, 3)).await.unwrap(), b"234");
        assert_eq!(provider.read(&doc, ByteRange::from_offset(8)).await.unwrap(), b"89");
        assert_eq!(provider.read(&doc, ByteRange::full()).await.unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn test_status_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = provider()
            .read(&location(&server, "/missing"), ByteRange::full())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Transfer { status: 404, .. }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_empty_range_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let data = provider()
            .read(&location(&server, "/doc"), ByteRange::new(10, 0))
            .await
            .unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: RemoteConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(config.user_agent.starts_with("casket/"));

        let config = RemoteConfig::default()
            .with_timeout(Duration::from_secs(90))
            .with_user_agent("probe");
        assert_eq!(config.timeout_secs, 90);
        assert_eq!(config.user_agent, "probe");
    }
}
