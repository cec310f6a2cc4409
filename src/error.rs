//! Unified error handling for the transfer-relay crate
//!
//! Every stage keeps its own error type (see [`crate::utils::error`]). The
//! errors that can abandon a source for the rest of a run are folded into
//! [`Error`], which the pipeline classifies at the source boundary.

use thiserror::Error;

pub use crate::notifications::ChannelError;
pub use crate::registry::RegistryError;
pub use crate::scheduler::SchedulerError;
pub use crate::utils::error::{ClassifyError, FetchError, InitError, PublishError, RewriteError};

/// Common trait for transfer-relay error types
pub trait RelayErrorTrait: std::error::Error {
    /// Check if this error may clear up on a later run
    fn is_recoverable(&self) -> bool;

    /// Get the error category for logging and status reporting
    fn category(&self) -> ErrorCategory;
}

/// Stage a source was abandoned in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Fetching a source timeline
    Fetch,
    /// Publishing a post
    Publish,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Publish => "publish",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end processing of one source for the current run
#[derive(Error, Debug)]
pub enum Error {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
}

impl RelayErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Publish(e) => e.is_recoverable(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) => ErrorCategory::Fetch,
            Self::Publish(_) => ErrorCategory::Publish,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
