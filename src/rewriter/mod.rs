//! Post rewriting and completion banners
//!
//! A [`TextRewriter`] turns the original post into the body that gets
//! published. Whatever produces the body, the [`BannerPolicy`] decides the
//! banner in front of it:
//!
//! | completion | source in allow-list | banner |
//! |---|---|---|
//! | yes | yes | `🚨 HERE WE GO 🚨` + blank line |
//! | yes | no | `🚨 TRANSFER COMPLETED 🚨` + blank line |
//! | no | - | `🚨 ` prefix |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

mod llm;

pub use llm::{LlmRewriter, RewriterConfig};

/// Banner used for completed transfers from allow-listed sources
pub const HERE_WE_GO_BANNER: &str = "🚨 HERE WE GO 🚨";

/// Banner used for completed transfers from every other source
pub const TRANSFER_COMPLETED_BANNER: &str = "🚨 TRANSFER COMPLETED 🚨";

/// Prefix for posts without a completion signal
pub const BREAKING_PREFIX: &str = "🚨";

/// Produces publishable text from an original post
///
/// Implementations never fail: an unavailable backend degrades to
/// [`BannerPolicy::apply`] over the original text.
#[async_trait]
pub trait TextRewriter: Send + Sync {
    async fn rewrite(&self, text: &str, source_id: &str, completion: bool) -> String;
}

/// Which completion banner a source receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerVariant {
    HereWeGo,
    TransferCompleted,
}

impl BannerVariant {
    pub fn banner(&self) -> &'static str {
        match self {
            Self::HereWeGo => HERE_WE_GO_BANNER,
            Self::TransferCompleted => TRANSFER_COMPLETED_BANNER,
        }
    }
}

/// Banner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerConfig {
    /// Sources whose completed transfers get the "HERE WE GO" banner
    #[serde(default = "default_here_we_go_sources")]
    pub here_we_go_sources: Vec<String>,
}

fn default_here_we_go_sources() -> Vec<String> {
    vec!["FabrizioRomano".to_string(), "David_Ornstein".to_string()]
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            here_we_go_sources: default_here_we_go_sources(),
        }
    }
}

/// Maps a source and completion signal to a banner
#[derive(Debug, Clone, Default)]
pub struct BannerPolicy {
    here_we_go: HashSet<String>,
}

impl BannerPolicy {
    pub fn new<I, S>(here_we_go_sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            here_we_go: here_we_go_sources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &BannerConfig) -> Self {
        Self::new(config.here_we_go_sources.iter().cloned())
    }

    /// Banner variant for a completed transfer from `source_id`
    pub fn variant_for(&self, source_id: &str) -> BannerVariant {
        if self.here_we_go.contains(source_id) {
            BannerVariant::HereWeGo
        } else {
            BannerVariant::TransferCompleted
        }
    }

    /// Put the banner in front of `body`
    pub fn apply(&self, body: &str, source_id: &str, completion: bool) -> String {
        if completion {
            format!("{}\n\n{body}", self.variant_for(source_id).banner())
        } else {
            format!("{BREAKING_PREFIX} {body}")
        }
    }
}

/// Rewriter that only applies the banner policy to the original text
#[derive(Debug, Clone, Default)]
pub struct LocalRewriter {
    policy: BannerPolicy,
}

impl LocalRewriter {
    pub fn new(policy: BannerPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl TextRewriter for LocalRewriter {
    async fn rewrite(&self, text: &str, source_id: &str, completion: bool) -> String {
        self.policy.apply(text, source_id, completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BannerPolicy {
        BannerPolicy::from_config(&BannerConfig::default())
    }

    #[test]
    fn test_here_we_go_for_allow_listed_source() {
        let text = policy().apply("Player to Club", "FabrizioRomano", true);
        assert_eq!(text, "🚨 HERE WE GO 🚨\n\nPlayer to Club");
    }

    #[test]
    fn test_transfer_completed_for_other_source() {
        let text = policy().apply("Player to Club", "SomeoneElse", true);
        assert_eq!(text, "🚨 TRANSFER COMPLETED 🚨\n\nPlayer to Club");
    }

    #[test]
    fn test_breaking_prefix_without_completion() {
        assert_eq!(
            policy().apply("Talks ongoing", "FabrizioRomano", false),
            "🚨 Talks ongoing"
        );
        assert_eq!(policy().apply("Talks ongoing", "X", false), "🚨 Talks ongoing");
    }

    #[test]
    fn test_allow_list_is_configurable() {
        let policy = BannerPolicy::new(["X"]);
        assert_eq!(policy.variant_for("X"), BannerVariant::HereWeGo);
        assert_eq!(policy.variant_for("FabrizioRomano"), BannerVariant::TransferCompleted);
    }

    #[test]
    fn test_allow_list_is_case_sensitive() {
        assert_eq!(
            policy().variant_for("fabrizioromano"),
            BannerVariant::TransferCompleted
        );
    }

    #[tokio::test]
    async fn test_local_rewriter_applies_policy() {
        let rewriter = LocalRewriter::new(policy());
        let text = rewriter.rewrite("Deal sealed", "David_Ornstein", true).await;
        assert!(text.starts_with(HERE_WE_GO_BANNER));
        assert!(text.ends_with("Deal sealed"));
    }
}
