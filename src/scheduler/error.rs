//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Interval must be at least one minute
    InvalidInterval { minutes: u64 },

    /// Trigger configuration error
    TriggerConfigError { field: String, reason: String },

    /// `start` called while the loop is already running
    AlreadyStarted,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInterval { minutes } => {
                write!(
                    f,
                    "Invalid interval '{}' minutes. Must be between 1 and {}",
                    minutes,
                    super::MAX_INTERVAL_MINUTES
                )
            }
            Self::TriggerConfigError { field, reason } => {
                write!(f, "Trigger config error in '{}': {}", field, reason)
            }
            Self::AlreadyStarted => write!(f, "Scheduler loop is already running"),
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    pub fn invalid_interval(minutes: u64) -> Self {
        Self::InvalidInterval { minutes }
    }

    pub fn trigger_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TriggerConfigError {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedulerError::invalid_interval(0);
        assert!(err.to_string().contains("'0' minutes"));

        let err = SchedulerError::trigger_config("interval", "too short");
        assert_eq!(err.to_string(), "Trigger config error in 'interval': too short");
    }
}
