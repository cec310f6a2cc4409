//! In-flight guard for pipeline runs

use std::sync::atomic::{AtomicBool, Ordering};

use crate::metrics;
use crate::models::RunOutcome;

/// Result of asking for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The run executed to completion
    Completed(Vec<RunOutcome>),
    /// Another run was in flight; this trigger was dropped
    Skipped,
}

impl TriggerOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn outcomes(&self) -> &[RunOutcome] {
        match self {
            Self::Completed(outcomes) => outcomes,
            Self::Skipped => &[],
        }
    }
}

/// Holds the in-flight flag for the lifetime of one run
///
/// The flag is cleared on drop, including when the run future is cancelled.
pub(crate) struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    /// Set the flag if it is clear. `None` means a run is already in flight.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        metrics::set_run_in_flight(true);
        Some(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        metrics::set_run_in_flight(false);
    }
}
