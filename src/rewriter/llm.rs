//! Hosted text-generation rewriter
//!
//! Sends the post to a text-generation inference endpoint and wraps the
//! generated text with the banner policy. Any failure (no key, transport
//! error, bad status, unparseable body) falls back to the banner policy
//! over the original text.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{BannerConfig, BannerPolicy, TextRewriter};
use crate::utils::error::RewriteError;

/// Configuration for the inference rewriter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriterConfig {
    /// Base URL of the inference API; the model path is appended
    pub endpoint: String,

    /// Model name, e.g. `google/flan-t5-large`
    pub model: String,

    /// Bearer token. Without one, every rewrite uses the local fallback.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum generated length
    pub max_length: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion banner allow-list
    pub banners: BannerConfig,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            model: "google/flan-t5-large".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_length: 280,
            temperature: 0.7,
            banners: BannerConfig::default(),
        }
    }
}

impl RewriterConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("RELAY_REWRITE_ENDPOINT").unwrap_or(defaults.endpoint),
            model: std::env::var("RELAY_REWRITE_MODEL").unwrap_or(defaults.model),
            api_key: std::env::var("HUGGINGFACE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            timeout_secs: std::env::var("RELAY_REWRITE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            max_length: defaults.max_length,
            temperature: defaults.temperature,
            banners: match std::env::var("RELAY_HERE_WE_GO_SOURCES") {
                Ok(list) => BannerConfig {
                    here_we_go_sources: list
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect(),
                },
                Err(_) => defaults.banners,
            },
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.model.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    inputs: String,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    max_length: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct Generation {
    #[serde(default)]
    generated_text: Option<String>,
}

/// Rewriter backed by a hosted text-generation model
pub struct LlmRewriter {
    client: Client,
    config: RewriterConfig,
    policy: BannerPolicy,
}

impl LlmRewriter {
    /// Create a rewriter from config
    pub fn new(config: RewriterConfig) -> Result<Self, RewriteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let policy = BannerPolicy::from_config(&config.banners);

        Ok(Self {
            client,
            config,
            policy,
        })
    }

    /// Create a rewriter from environment variables
    pub fn from_env() -> Result<Self, RewriteError> {
        Self::new(RewriterConfig::from_env())
    }

    pub fn policy(&self) -> &BannerPolicy {
        &self.policy
    }

    fn build_prompt(text: &str) -> String {
        format!(
            "Rewrite this football transfer news in a clear, concise format. \
             Keep the main facts but make it more engaging and easier to read. \
             Original text: \"{text}\""
        )
    }

    /// Call the inference endpoint. Empty generations yield the original text.
    pub async fn generate(&self, text: &str) -> Result<String, RewriteError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(RewriteError::MissingCredentials)?;

        let request = GenerateRequest {
            inputs: Self::build_prompt(text),
            parameters: GenerateParameters {
                max_length: self.config.max_length,
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(self.config.url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RewriteError::Status { status, body });
        }

        let generations: Vec<Generation> = response.json().await?;
        let generated = generations
            .into_iter()
            .next()
            .and_then(|g| g.generated_text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(generated.unwrap_or_else(|| text.to_string()))
    }
}

#[async_trait]
impl TextRewriter for LlmRewriter {
    async fn rewrite(&self, text: &str, source_id: &str, completion: bool) -> String {
        let body = match self.generate(text).await {
            Ok(body) => {
                tracing::debug!(source = %source_id, "Rewrite completed");
                body
            }
            Err(RewriteError::MissingCredentials) => {
                tracing::debug!(source = %source_id, "No rewrite key, using original text");
                text.to_string()
            }
            Err(e) => {
                tracing::warn!(source = %source_id, error = %e, "Rewrite failed, using fallback");
                text.to_string()
            }
        };

        self.policy.apply(&body, source_id, completion)
    }
}
