//! Publishing to the outbound platform
//!
//! A [`Publisher`] accepts final post text and reports success or failure.
//! The pipeline never retries a failed publish within a run.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::utils::error::{InitError, PublishError};
use crate::utils::preview;

/// Publishes final post text
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Acquire the publishing session. Failure is fatal at startup.
    async fn open(&self) -> Result<(), InitError> {
        Ok(())
    }

    /// Publish one post. `Ok` means the post is live.
    async fn publish(&self, text: &str) -> Result<(), PublishError>;

    /// Release the publishing session
    async fn close(&self) {}
}

/// Publisher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Endpoint accepting `{"text": ...}` POST requests
    pub endpoint: String,

    /// Bearer token for the endpoint
    #[serde(skip_serializing)]
    pub bearer_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Log posts instead of publishing them
    pub dry_run: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.twitter.com/2/tweets".to_string(),
            bearer_token: None,
            timeout_secs: 30,
            dry_run: false,
        }
    }
}

impl PublisherConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("RELAY_PUBLISH_ENDPOINT").unwrap_or(defaults.endpoint),
            bearer_token: std::env::var("RELAY_PUBLISH_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            timeout_secs: std::env::var("RELAY_PUBLISH_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            dry_run: std::env::var("RELAY_DRY_RUN")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePost<'a> {
    text: &'a str,
}

/// Publisher posting to an HTTP API with a bearer token
pub struct ApiPublisher {
    client: Client,
    config: PublisherConfig,
    open: AtomicBool,
}

impl ApiPublisher {
    pub fn new(config: PublisherConfig) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            open: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Publisher for ApiPublisher {
    async fn open(&self) -> Result<(), InitError> {
        if self.config.bearer_token.is_none() {
            return Err(InitError::Publisher(
                "no publish token configured (RELAY_PUBLISH_TOKEN)".to_string(),
            ));
        }
        self.open.store(true, Ordering::SeqCst);
        tracing::info!(endpoint = %self.config.endpoint, "Publisher initialized");
        Ok(())
    }

    async fn publish(&self, text: &str) -> Result<(), PublishError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(PublishError::SessionClosed);
        }
        let token = self
            .config
            .bearer_token
            .as_deref()
            .ok_or(PublishError::SessionClosed)?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(token)
            .json(&CreatePost { text })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::TOO_MANY_REQUESTS => Err(PublishError::RateLimited),
            status => Err(PublishError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        tracing::info!("Publisher closed");
    }
}

/// Publisher that only logs what it would post
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    published: AtomicU64,
}

impl DryRunPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of posts accepted so far
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, text: &str) -> Result<(), PublishError> {
        self.published.fetch_add(1, Ordering::Relaxed);
        tracing::info!(preview = %preview(text), "Dry run, not publishing");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> PublisherConfig {
        PublisherConfig {
            endpoint: format!("{}/2/tweets", server.uri()),
            bearer_token: Some("token".to_string()),
            timeout_secs: 5,
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn test_open_requires_token() {
        let publisher = ApiPublisher::new(PublisherConfig::default()).unwrap();
        assert!(matches!(publisher.open().await, Err(InitError::Publisher(_))));
    }

    #[tokio::test]
    async fn test_publish_before_open_fails() {
        let server = MockServer::start().await;
        let publisher = ApiPublisher::new(config_for(&server)).unwrap();
        assert!(matches!(
            publisher.publish("hello").await,
            Err(PublishError::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn test_publish_posts_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(header("authorization", "Bearer token"))
            .and(body_json(serde_json::json!({ "text": "🚨 Deal done" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = ApiPublisher::new(config_for(&server)).unwrap();
        publisher.open().await.unwrap();
        publisher.publish("🚨 Deal done").await.unwrap();
    }

    #[tokio::test]
    async fn test_publish_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("duplicate"))
            .mount(&server)
            .await;

        let publisher = ApiPublisher::new(config_for(&server)).unwrap();
        publisher.open().await.unwrap();

        assert!(matches!(
            publisher.publish("a").await,
            Err(PublishError::RateLimited)
        ));
        match publisher.publish("a").await {
            Err(PublishError::Rejected { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "duplicate");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_ends_session() {
        let server = MockServer::start().await;
        let publisher = ApiPublisher::new(config_for(&server)).unwrap();
        publisher.open().await.unwrap();
        publisher.close().await;
        assert!(matches!(
            publisher.publish("late").await,
            Err(PublishError::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn test_dry_run_counts() {
        let publisher = DryRunPublisher::new();
        publisher.publish("one").await.unwrap();
        publisher.publish("two").await.unwrap();
        assert_eq!(publisher.published(), 2);
    }
}
