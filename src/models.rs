// Core data structures for transfer-relay

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trust tier of a source, ordered from most to least trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrustTier {
    #[serde(rename = "🟢")]
    Green,
    #[serde(rename = "🟡")]
    Yellow,
    #[serde(rename = "🟠")]
    Orange,
    #[serde(rename = "🔴")]
    Red,
}

impl TrustTier {
    /// All tiers in trust order
    pub const ALL: [TrustTier; 4] = [Self::Green, Self::Yellow, Self::Orange, Self::Red];

    /// Glyph rendered in the provenance footer
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Green => "🟢",
            Self::Yellow => "🟡",
            Self::Orange => "🟠",
            Self::Red => "🔴",
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }

    /// Parse from a glyph
    pub fn from_glyph(glyph: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.glyph() == glyph.trim())
    }
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

impl FromStr for TrustTier {
    type Err = String;

    /// Accepts either the glyph or the colour name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(tier) = Self::from_glyph(s) {
            return Ok(tier);
        }
        match s.trim().to_lowercase().as_str() {
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "orange" => Ok(Self::Orange),
            "red" => Ok(Self::Red),
            other => Err(format!("Unknown trust tier: {other}")),
        }
    }
}

/// A monitored journalist account
///
/// Owned by the registry; the pipeline only ever reads a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Account handle, unique within the registry
    pub id: String,
    pub name: String,
    pub tier: TrustTier,
    /// Reliability percentage, 0-100 inclusive
    pub reliability: u8,
    pub active: bool,
}

impl Source {
    /// Create an active source; reliability is clamped to 100
    pub fn new(id: impl Into<String>, tier: TrustTier, reliability: u8) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            tier,
            reliability: reliability.min(100),
            active: true,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the active flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// `@handle` form used in logs and notifications
    pub fn handle(&self) -> String {
        format!("@{}", self.id)
    }
}

/// A post fetched from a source timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    /// Post identifier, used as the dedup key
    pub id: String,
    pub text: String,
    pub source_id: String,
    pub observed_at: DateTime<Utc>,
    pub link: Option<String>,
}

impl RawItem {
    /// Create an item observed now
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source_id: source_id.into(),
            observed_at: Utc::now(),
            link: None,
        }
    }

    pub fn with_observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = observed_at;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Final publishable text: rewritten body plus provenance footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPayload {
    pub body: String,
    pub footer: String,
}

impl PublishPayload {
    pub fn into_text(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PublishPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", self.body, self.footer)
    }
}

/// How processing of one source ended within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceStatus {
    /// All fetched items were handled
    Completed,
    /// The feed returned no items
    Empty,
    /// The fetch failed; the source was abandoned for this run
    FetchFailed(String),
    /// An error escaped item processing and was caught at the source boundary
    Aborted(String),
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Empty => "empty",
            Self::FetchFailed(_) => "fetch_failed",
            Self::Aborted(_) => "aborted",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed(_) | Self::Aborted(_))
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed(reason) | Self::Aborted(reason) => {
                write!(f, "{}: {reason}", self.as_str())
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Per-source counters for one run. Reporting only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub source_id: String,
    pub status: SourceStatus,
    /// Items returned by the feed
    pub seen: usize,
    pub skipped_duplicate: usize,
    pub skipped_irrelevant: usize,
    pub published: usize,
    pub failed: usize,
}

impl RunOutcome {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            status: SourceStatus::Completed,
            seen: 0,
            skipped_duplicate: 0,
            skipped_irrelevant: 0,
            published: 0,
            failed: 0,
        }
    }

    /// One-line summary for logs and notifications
    pub fn summary(&self) -> String {
        format!(
            "@{}: {} (seen {}, published {}, failed {}, duplicate {}, irrelevant {})",
            self.source_id,
            self.status,
            self.seen,
            self.published,
            self.failed,
            self.skipped_duplicate,
            self.skipped_irrelevant
        )
    }
}
