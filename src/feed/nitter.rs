//! Nitter timeline scraper
//!
//! Reads the public HTML timeline of a Nitter instance. Each
//! `.timeline-item` becomes a [`RawItem`] whose id is the status id taken
//! from the item's permalink.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use lazy_static::lazy_static;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT},
    Client, StatusCode,
};
use scraper::{ElementRef, Html, Selector};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

use super::{FeedConfig, SourceFeed};
use crate::models::RawItem;
use crate::utils::error::{FetchError, InitError};
use crate::utils::normalize_whitespace;

macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    static ref TIMELINE_ITEM: Selector = parse_selector!(".timeline-item");
    static ref TWEET_CONTENT: Selector = parse_selector!(".tweet-content");
    static ref TWEET_DATE: Selector = parse_selector!(".tweet-date a");
    static ref TWEET_LINK: Selector = parse_selector!("a.tweet-link");
}

/// Date format of the `title` attribute on `.tweet-date a`
const NITTER_DATE_FORMAT: &str = "%b %d, %Y · %I:%M %p UTC";

/// Feed backed by a Nitter instance
pub struct NitterFeed {
    client: Client,
    base_url: Url,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    closed: AtomicBool,
}

impl NitterFeed {
    /// Create a feed from config
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for a malformed base URL and
    /// `FetchError::Http` if the HTTP client cannot be built
    pub fn new(config: &FeedConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let mut headers = HeaderMap::new();
        if let Ok(agent) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, agent);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .gzip(true)
            .cookie_store(true)
            .build()?;

        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            base_url,
            rate_limiter,
            closed: AtomicBool::new(false),
        })
    }

    /// `<base>/<id>`, keeping any path prefix of the base URL
    fn timeline_url(&self, source_id: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(format!("{}: cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push(source_id.trim_start_matches('@'));
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

#[async_trait]
impl SourceFeed for NitterFeed {
    async fn open(&self) -> Result<(), InitError> {
        self.rate_limiter.until_ready().await;
        self.client
            .get(self.base_url.clone())
            .send()
            .await
            .map_err(|e| InitError::Feed(format!("{}: {e}", self.base_url)))?;

        self.closed.store(false, Ordering::SeqCst);
        tracing::info!(base = %self.base_url, "Timeline feed initialized");
        Ok(())
    }

    async fn fetch_latest(
        &self,
        source_id: &str,
        count: usize,
    ) -> Result<Vec<RawItem>, FetchError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FetchError::SessionClosed);
        }

        let url = self.timeline_url(source_id)?;
        self.rate_limiter.until_ready().await;
        tracing::debug!(source = %source_id, url = %url, "Fetching timeline");

        let response = self.client.get(url.clone()).send().await?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(FetchError::SourceNotFound(source_id.to_string())),
            StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::RateLimit),
            status => return Err(FetchError::ServerError(status.as_u16())),
        }

        let html = response.text().await?;
        let items = parse_timeline(&html, source_id, &url, count);
        tracing::debug!(source = %source_id, count = items.len(), "Timeline parsed");
        Ok(items)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        tracing::info!("Timeline feed closed");
    }
}

/// Extract up to `count` items from a timeline page
///
/// Entries without text or without a permalink are skipped.
pub fn parse_timeline(html: &str, source_id: &str, page_url: &Url, count: usize) -> Vec<RawItem> {
    let document = Html::parse_document(html);

    document
        .select(&TIMELINE_ITEM)
        .filter_map(|entry| parse_entry(entry, source_id, page_url))
        .take(count)
        .collect()
}

fn parse_entry(entry: ElementRef<'_>, source_id: &str, page_url: &Url) -> Option<RawItem> {
    let text = entry
        .select(&TWEET_CONTENT)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())?;

    let href = entry
        .select(&TWEET_LINK)
        .next()
        .and_then(|el| el.value().attr("href"))?;
    let link = page_url.join(href).ok()?;
    let id = status_id(&link)?;

    let observed_at = entry
        .select(&TWEET_DATE)
        .next()
        .and_then(|el| el.value().attr("title"))
        .and_then(parse_nitter_date)
        .unwrap_or_else(Utc::now);

    Some(
        RawItem::new(id, text, source_id)
            .with_observed_at(observed_at)
            .with_link(link.as_str()),
    )
}

/// Last non-empty path segment of a permalink, fragment and query ignored
fn status_id(link: &Url) -> Option<String> {
    link.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

fn parse_nitter_date(title: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(title.trim(), NITTER_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
