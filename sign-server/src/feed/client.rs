//! HTTP feed client.

use std::future::Future;
use std::time::Duration;

use prost::Message;
use reqwest::header::{HeaderMap, HeaderValue};

use super::error::FetchError;
use super::mock::MockFeedSource;
use super::snapshot::FeedSnapshot;

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Something that can fetch and decode one feed.
///
/// One call is one upstream request. Implementations must not cache or
/// retry; that policy belongs to [`crate::cache::FeedCache`].
pub trait FeedSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FeedSnapshot, FetchError>> + Send;
}

/// Configuration for the HTTP feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// Optional API key sent as `x-api-key`
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedClientConfig {
    pub fn new() -> Self {
        Self {
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Send an API key with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetches GTFS-realtime protobuf feeds over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    http: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(config: FeedClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| FetchError::InvalidApiKey)?;
            headers.insert("x-api-key", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http })
    }
}

impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<FeedSnapshot, FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.bytes().await?;
        let message = gtfs_rt::FeedMessage::decode(&*body)?;

        Ok(FeedSnapshot::from(message))
    }
}

/// The feed source the server runs with.
#[derive(Debug, Clone)]
pub enum FeedBackend {
    Http(HttpFeedSource),
    Mock(MockFeedSource),
}

impl FeedSource for FeedBackend {
    async fn fetch(&self, url: &str) -> Result<FeedSnapshot, FetchError> {
        match self {
            FeedBackend::Http(source) => source.fetch(url).await,
            FeedBackend::Mock(source) => source.fetch(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use gtfs_rt::{FeedEntity, FeedMessage, TripUpdate};
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral local port; returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn source() -> HttpFeedSource {
        HttpFeedSource::new(FeedClientConfig::new().with_timeout(5)).unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = FeedClientConfig::default();
        assert_eq!(config.api_key, None);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn config_builders() {
        let config = FeedClientConfig::new().with_api_key("secret").with_timeout(3);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn rejects_unprintable_api_key() {
        let config = FeedClientConfig::new().with_api_key("bad\nkey");
        assert!(matches!(
            HttpFeedSource::new(config),
            Err(FetchError::InvalidApiKey)
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        let source = HttpFeedSource::new(FeedClientConfig::new().with_timeout(1)).unwrap();
        let result = source.fetch("http://127.0.0.1:9/feed").await;
        assert!(matches!(result, Err(FetchError::Http(_))));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let base = serve(Router::new().route(
            "/feed",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down for maintenance") }),
        ))
        .await;

        let result = source().fetch(&format!("{base}/feed")).await;
        match result {
            Err(FetchError::Status { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_decode_error() {
        let base = serve(Router::new().route(
            "/feed",
            get(|| async { vec![0xFF_u8, 0xFE, 0x00, 0x01] }),
        ))
        .await;

        let result = source().fetch(&format!("{base}/feed")).await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn decodes_protobuf_body() {
        let mut update = TripUpdate::default();
        update.trip.route_id = Some("F".to_string());
        let message = FeedMessage {
            entity: vec![FeedEntity {
                id: "1".to_string(),
                trip_update: Some(update),
                ..Default::default()
            }],
            ..Default::default()
        };
        let body = message.encode_to_vec();

        let base = serve(Router::new().route("/feed", get(move || async move { body })))
            .await;

        let snapshot = source().fetch(&format!("{base}/feed")).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entities[0].route_id.as_deref(), Some("F"));
    }
}
