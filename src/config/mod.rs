//! Configuration management for transfer-relay
//!
//! Configuration comes from a TOML file or from environment variables, and
//! command-line flags override either. Secrets (rewrite API key, publish
//! token, webhook URL) are taken from the environment when the file leaves
//! them out.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classifier::ClassifierConfig;
use crate::feed::FeedConfig;
use crate::notifications::NotificationConfig;
use crate::pipeline::PipelineConfig;
use crate::publisher::PublisherConfig;
use crate::registry::RegistryConfig;
use crate::rewriter::RewriterConfig;
use crate::scheduler::MAX_INTERVAL_MINUTES;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub pipeline: PipelineConfig,
    pub feed: FeedConfig,
    pub classifier: ClassifierConfig,
    pub rewriter: RewriterConfig,
    pub publisher: PublisherConfig,
    pub notifications: NotificationConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

/// Run cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minutes between scheduled runs
    pub interval_minutes: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive: crate logs at `level`, dependencies at warn
    pub fn filter_directive(&self) -> String {
        format!("transfer_relay={},warn", self.level.to_lowercase())
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let interval_minutes = env_parse("CHECK_INTERVAL_MINUTES")
            .or_else(|| env_parse("RELAY_INTERVAL_MINUTES"))
            .unwrap_or(defaults.scheduler.interval_minutes);

        let pipeline = PipelineConfig {
            cooldown_secs: env_parse("RELAY_COOLDOWN_SECS")
                .unwrap_or(defaults.pipeline.cooldown_secs),
            fetch_count: env_parse("RELAY_FETCH_COUNT").unwrap_or(defaults.pipeline.fetch_count),
        };

        let feed = FeedConfig {
            base_url: std::env::var("RELAY_FEED_URL").unwrap_or(defaults.feed.base_url),
            requests_per_second: env_parse("RELAY_FEED_RATE_LIMIT")
                .unwrap_or(defaults.feed.requests_per_second),
            timeout_secs: env_parse("RELAY_FEED_TIMEOUT").unwrap_or(defaults.feed.timeout_secs),
            user_agent: std::env::var("RELAY_USER_AGENT").unwrap_or(defaults.feed.user_agent),
        };

        let registry = match std::env::var("RELAY_REGISTRY_PATH") {
            Ok(path) => RegistryConfig { path: path.into() },
            Err(_) => defaults.registry,
        };

        let logging = LoggingConfig {
            level: std::env::var("RELAY_LOG_LEVEL").unwrap_or(defaults.logging.level),
            format: std::env::var("RELAY_LOG_FORMAT").unwrap_or(defaults.logging.format),
        };

        Ok(Self {
            scheduler: SchedulerConfig { interval_minutes },
            pipeline,
            feed,
            classifier: defaults.classifier,
            rewriter: RewriterConfig::from_env(),
            publisher: PublisherConfig::from_env(),
            notifications: NotificationConfig::from_env(),
            registry,
            logging,
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.fill_secrets_from_env();
        Ok(config)
    }

    fn fill_secrets_from_env(&mut self) {
        if self.rewriter.api_key.is_none() {
            self.rewriter.api_key = RewriterConfig::from_env().api_key;
        }
        if self.publisher.bearer_token.is_none() {
            self.publisher.bearer_token = PublisherConfig::from_env().bearer_token;
        }
        let notifications = NotificationConfig::from_env();
        if self.notifications.webhook_url.is_none() {
            self.notifications.webhook_url = notifications.webhook_url;
        }
        if self.notifications.webhook_token.is_none() {
            self.notifications.webhook_token = notifications.webhook_token;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_INTERVAL_MINUTES).contains(&self.scheduler.interval_minutes) {
            anyhow::bail!(
                "interval_minutes must be between 1 and {MAX_INTERVAL_MINUTES}, got {}",
                self.scheduler.interval_minutes
            );
        }

        if self.pipeline.fetch_count == 0 {
            anyhow::bail!("fetch_count must be greater than 0");
        }

        if self.feed.requests_per_second == 0 {
            anyhow::bail!("feed requests_per_second must be greater than 0");
        }

        url::Url::parse(&self.feed.base_url)
            .with_context(|| format!("Invalid feed base_url: {}", self.feed.base_url))?;

        if !(0.0..=2.0).contains(&self.rewriter.temperature) {
            anyhow::bail!("rewriter temperature must be within 0.0-2.0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging format must be 'text' or 'json'");
        }

        self.logging
            .level
            .parse::<tracing::Level>()
            .map_err(|_| anyhow::anyhow!("Invalid logging level: {}", self.logging.level))?;

        Ok(())
    }
}
