//! Source registry
//!
//! The registry owns the list of monitored accounts. The pipeline only
//! receives an immutable snapshot per run, taken through [`SourceRegistry::load`].
//!
//! The file format is the journalist document used by the deployed bot:
//!
//! ```json
//! {
//!   "journalists": [
//!     { "id": 1, "username": "FabrizioRomano", "name": "Fabrizio Romano",
//!       "tier": "🟢", "reliability": 90, "active": true,
//!       "specialPhrases": ["here we go"] }
//!   ]
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{Source, TrustTier};
use crate::notifications::{NoticeKind, NotificationSink};

/// Errors loading the registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Registry file could not be read
    #[error("Failed to read registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry file is not a valid journalist document
    #[error("Failed to parse registry {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Provides the current list of sources
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    /// All registered sources in registry order, active or not
    async fn load(&self) -> Result<Vec<Source>, RegistryError>;

    /// Active sources only
    async fn load_active(&self) -> Result<Vec<Source>, RegistryError> {
        Ok(self.load().await?.into_iter().filter(|s| s.active).collect())
    }
}

/// First registry load at startup
///
/// A failure here is fatal to the caller, so it is notified before being
/// returned.
pub async fn load_startup_snapshot(
    registry: &dyn SourceRegistry,
    notifier: &dyn NotificationSink,
) -> Result<Vec<Source>, RegistryError> {
    match registry.load().await {
        Ok(sources) => Ok(sources),
        Err(e) => {
            tracing::error!(error = %e, "Initialization failed");
            notifier
                .notify(NoticeKind::Error, &format!("Initialization failed: {e}"))
                .await;
            Err(e)
        }
    }
}

/// Registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Path of the journalist document
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/journalists.json"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    journalists: Vec<JournalistRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JournalistRecord {
    username: String,
    #[serde(default)]
    name: Option<String>,
    tier: String,
    reliability: f64,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    #[allow(dead_code)]
    special_phrases: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl JournalistRecord {
    fn into_source(self) -> Result<Source, String> {
        let username = self.username.trim().trim_start_matches('@').to_string();
        if username.is_empty() {
            return Err("empty username".to_string());
        }

        let tier: TrustTier = self.tier.parse()?;

        if !(0.0..=100.0).contains(&self.reliability) {
            return Err(format!(
                "reliability {} outside 0-100 for @{username}",
                self.reliability
            ));
        }
        let reliability = self.reliability.round() as u8;

        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| username.clone());

        Ok(Source::new(username, tier, reliability)
            .with_name(name)
            .with_active(self.active))
    }
}

/// Parse a journalist document. Invalid entries are skipped with a warning.
pub fn parse_registry(json: &str) -> Result<Vec<Source>, serde_json::Error> {
    let document: RegistryDocument = serde_json::from_str(json)?;

    let sources = document
        .journalists
        .into_iter()
        .filter_map(|record| match record.into_source() {
            Ok(source) => Some(source),
            Err(reason) => {
                tracing::warn!(%reason, "Skipping invalid registry entry");
                None
            }
        })
        .collect();

    Ok(sources)
}

/// Registry backed by a JSON file, re-read on every load
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SourceRegistry for FileRegistry {
    async fn load(&self) -> Result<Vec<Source>, RegistryError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| RegistryError::Io {
                path: self.path.clone(),
                source,
            })?;

        let sources = parse_registry(&json).map_err(|source| RegistryError::Parse {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), count = sources.len(), "Registry loaded");
        Ok(sources)
    }
}

/// Fixed in-memory registry
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    sources: Vec<Source>,
}

impl StaticRegistry {
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl SourceRegistry for StaticRegistry {
    async fn load(&self) -> Result<Vec<Source>, RegistryError> {
        Ok(self.sources.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DOCUMENT: &str = r#"{
        "journalists": [
            { "id": 1, "username": "FabrizioRomano", "name": "Fabrizio Romano",
              "tier": "🟢", "reliability": 90, "active": true,
              "specialPhrases": ["here we go"] },
            { "id": 2, "username": "X", "tier": "🟡", "reliability": 60, "active": true },
            { "id": 3, "username": "Retired", "name": "Retired", "tier": "🔴",
              "reliability": 10, "active": false },
            { "id": 4, "username": "Broken", "tier": "🟣", "reliability": 50, "active": true },
            { "id": 5, "username": "TooSure", "tier": "🟢", "reliability": 150, "active": true }
        ]
    }"#;

    #[test]
    fn test_parse_registry_keeps_order_and_skips_invalid() {
        let sources = parse_registry(DOCUMENT).unwrap();
        let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["FabrizioRomano", "X", "Retired"]);

        assert_eq!(sources[0].name, "Fabrizio Romano");
        assert_eq!(sources[0].tier, TrustTier::Green);
        assert_eq!(sources[0].reliability, 90);
        assert_eq!(sources[1].name, "X");
        assert!(!sources[2].active);
    }

    #[tokio::test]
    async fn test_load_active_filters_inactive() {
        let registry = StaticRegistry::new(parse_registry(DOCUMENT).unwrap());
        let active = registry.load_active().await.unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|s| s.active));
    }

    #[tokio::test]
    async fn test_file_registry_rereads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "journalists": [] }}"#).unwrap();
        let registry = FileRegistry::new(file.path());
        assert!(registry.load().await.unwrap().is_empty());

        std::fs::write(file.path(), DOCUMENT).unwrap();
        assert_eq!(registry.load().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_file_registry_errors() {
        let missing = FileRegistry::new("/nonexistent/journalists.json");
        assert!(matches!(missing.load().await, Err(RegistryError::Io { .. })));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let broken = FileRegistry::new(file.path());
        assert!(matches!(broken.load().await, Err(RegistryError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_startup_load_failure_is_notified() {
        use crate::notifications::Notice;
        use std::sync::Mutex;

        #[derive(Default)]
        struct Collect(Mutex<Vec<Notice>>);

        #[async_trait]
        impl NotificationSink for Collect {
            async fn notify(&self, kind: NoticeKind, message: &str) {
                self.0.lock().unwrap().push(Notice::new(kind, message));
            }
        }

        let sink = Collect::default();
        let missing = FileRegistry::new("/nonexistent/journalists.json");
        let err = load_startup_snapshot(&missing, &sink).await.unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));

        let notices = sink.0.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Error);
        assert!(notices[0].message.starts_with("Initialization failed: Failed to read registry"));

        drop(notices);
        let registry = StaticRegistry::new(parse_registry(DOCUMENT).unwrap());
        assert_eq!(load_startup_snapshot(&registry, &sink).await.unwrap().len(), 3);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }
}
