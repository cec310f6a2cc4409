//! In-memory deduplication ledger
//!
//! Tracks which post identifiers have already been handled so a post is
//! published at most once per process lifetime:
//! - Append-only; there is no eviction and no TTL
//! - Not persisted; a restart starts from an empty ledger
//! - Owned by the pipeline orchestrator, which is the only writer

use std::collections::HashSet;

/// Set of handled item identifiers
#[derive(Debug, Default, Clone)]
pub struct DedupLedger {
    seen: HashSet<String>,
}

impl DedupLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether an id has been handled
    pub fn has_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record an id as handled. Marking twice is a no-op.
    pub fn mark_seen(&mut self, id: impl Into<String>) {
        self.seen.insert(id.into());
    }

    /// Number of recorded ids
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
