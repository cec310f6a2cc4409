//! Relevance and completion classification
//!
//! Two independent questions are asked of every post:
//! - is it football transfer news at all (relevance)
//! - does it describe a finalised move rather than a rumour (completion)
//!
//! The pipeline treats a classifier error as "not relevant" / "no
//! completion", so implementations may fail freely.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::utils::error::ClassifyError;

/// Keywords marking a post as football related
pub const DEFAULT_RELEVANCE_KEYWORDS: &[&str] = &[
    "transfer",
    "signing",
    "contract",
    "deal",
    "fee",
    "club",
    "player",
    "football",
    "soccer",
    "manchester",
    "liverpool",
    "chelsea",
    "arsenal",
    "barcelona",
    "madrid",
    "psg",
    "bayern",
    "juventus",
    "milan",
    "here we go",
    "done deal",
    "confirmed",
    "official",
    "announce",
];

/// Keywords marking a transfer as completed
pub const DEFAULT_COMPLETION_KEYWORDS: &[&str] = &[
    "signed",
    "completed",
    "done deal",
    "confirmed",
    "official",
    "announced",
    "here we go",
    "sealed",
    "finalized",
];

/// Decides relevance and completion signal for a post
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    /// Whether the text is in scope for republishing
    async fn is_relevant(&self, text: &str) -> Result<bool, ClassifyError>;

    /// Whether the text reports a finalised event
    async fn has_completion_signal(&self, text: &str) -> Result<bool, ClassifyError>;
}

/// Keyword lists for [`KeywordClassifier`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_relevance")]
    pub relevance_keywords: Vec<String>,
    #[serde(default = "default_completion")]
    pub completion_keywords: Vec<String>,
}

fn default_relevance() -> Vec<String> {
    DEFAULT_RELEVANCE_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

fn default_completion() -> Vec<String> {
    DEFAULT_COMPLETION_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            relevance_keywords: default_relevance(),
            completion_keywords: default_completion(),
        }
    }
}

/// Case-insensitive substring matcher over two keyword lists
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    relevance: Option<Regex>,
    completion: Option<Regex>,
}

impl KeywordClassifier {
    /// Build from a config; an empty list never matches
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        Ok(Self {
            relevance: compile(&config.relevance_keywords)?,
            completion: compile(&config.completion_keywords)?,
        })
    }

    /// Build with the built-in football keyword lists
    pub fn with_defaults() -> Result<Self, ClassifyError> {
        Self::new(&ClassifierConfig::default())
    }

    fn matches(pattern: &Option<Regex>, text: &str) -> bool {
        pattern.as_ref().is_some_and(|re| re.is_match(text))
    }
}

fn compile(keywords: &[String]) -> Result<Option<Regex>, ClassifyError> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()?;
    Ok(Some(pattern))
}

#[async_trait]
impl ContentClassifier for KeywordClassifier {
    async fn is_relevant(&self, text: &str) -> Result<bool, ClassifyError> {
        let relevant = Self::matches(&self.relevance, text);
        tracing::debug!(relevant, "Football keyword check");
        Ok(relevant)
    }

    async fn has_completion_signal(&self, text: &str) -> Result<bool, ClassifyError> {
        Ok(Self::matches(&self.completion, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_relevant_transfer_news() {
        let classifier = KeywordClassifier::with_defaults().unwrap();
        let text = "Club confirms signing of Player Y, deal done.";
        assert!(classifier.is_relevant(text).await.unwrap());
        assert!(classifier.has_completion_signal(text).await.unwrap());
    }

    #[tokio::test]
    async fn test_irrelevant_post() {
        let classifier = KeywordClassifier::with_defaults().unwrap();
        let text = "Lovely sunset over the city tonight";
        assert!(!classifier.is_relevant(text).await.unwrap());
        assert!(!classifier.has_completion_signal(text).await.unwrap());
    }

    #[tokio::test]
    async fn test_case_insensitive() {
        let classifier = KeywordClassifier::with_defaults().unwrap();
        assert!(classifier.is_relevant("HERE WE GO!").await.unwrap());
        assert!(classifier.has_completion_signal("Here We Go").await.unwrap());
    }

    #[tokio::test]
    async fn test_rumour_is_relevant_without_completion() {
        let classifier = KeywordClassifier::with_defaults().unwrap();
        let text = "Arsenal exploring a move for the midfielder, talks ongoing";
        assert!(classifier.is_relevant(text).await.unwrap());
        assert!(!classifier.has_completion_signal(text).await.unwrap());
    }

    #[tokio::test]
    async fn test_keywords_are_literal() {
        let config = ClassifierConfig {
            relevance_keywords: vec!["a.b".to_string()],
            completion_keywords: vec![],
        };
        let classifier = KeywordClassifier::new(&config).unwrap();
        assert!(classifier.is_relevant("see a.b here").await.unwrap());
        assert!(!classifier.is_relevant("see axb here").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_list_never_matches() {
        let config = ClassifierConfig {
            relevance_keywords: vec!["  ".to_string()],
            completion_keywords: vec![],
        };
        let classifier = KeywordClassifier::new(&config).unwrap();
        assert!(!classifier.is_relevant("transfer").await.unwrap());
        assert!(!classifier.has_completion_signal("signed").await.unwrap());
    }
}
