//! Error types for the relay pipeline stages
//!
//! Each external collaborator has its own error type so the pipeline can
//! apply a different containment rule per stage.

use thiserror::Error;

/// Errors from fetching a source timeline
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Timeline does not exist
    #[error("Source not found: @{0}")]
    SourceNotFound(String),

    /// Invalid request URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Feed session was released
    #[error("Feed session is closed")]
    SessionClosed,
}

impl FetchError {
    /// Whether a later run may succeed where this one failed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimit | Self::ServerError(_) => true,
            Self::SourceNotFound(_) | Self::InvalidUrl(_) | Self::SessionClosed => false,
        }
    }
}

/// Errors from the relevance / completion classifier
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Keyword pattern could not be compiled
    #[error("Invalid keyword pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Classifier backend unavailable
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the external rewrite endpoint
#[derive(Error, Debug)]
pub enum RewriteError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Rewrite endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// No API key configured
    #[error("No rewrite API key configured")]
    MissingCredentials,
}

/// Errors from a publish attempt
#[derive(Error, Debug)]
pub enum PublishError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Platform rate limit hit
    #[error("Rate limited by platform")]
    RateLimited,

    /// Platform refused the post
    #[error("Post rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Publisher session is not open
    #[error("Publisher session is not open")]
    SessionClosed,
}

impl PublishError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited | Self::SessionClosed => true,
            Self::Rejected { status, .. } => *status >= 500,
        }
    }
}

/// Fatal errors acquiring external sessions at startup
#[derive(Error, Debug)]
pub enum InitError {
    /// Source feed session could not be opened
    #[error("Failed to open source feed: {0}")]
    Feed(String),

    /// Publisher session could not be opened
    #[error("Failed to open publisher: {0}")]
    Publisher(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_recoverable() {
        assert!(FetchError::ServerError(503).is_recoverable());
        assert!(FetchError::RateLimit.is_recoverable());
        assert!(!FetchError::SourceNotFound("nobody".to_string()).is_recoverable());
        assert!(!FetchError::SessionClosed.is_recoverable());
    }

    #[test]
    fn test_publish_error_recoverable() {
        assert!(PublishError::RateLimited.is_recoverable());
        let client_side = PublishError::Rejected {
            status: 403,
            body: "duplicate content".to_string(),
        };
        assert!(!client_side.is_recoverable());
        let server_side = PublishError::Rejected {
            status: 502,
            body: String::new(),
        };
        assert!(server_side.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::SourceNotFound("FabrizioRomano".to_string());
        assert_eq!(err.to_string(), "Source not found: @FabrizioRomano");

        let err = InitError::Publisher("missing token".to_string());
        assert!(err.to_string().contains("missing token"));
    }
}
