//! Error types for the clock crate.

use pacer_engine::EngineError;
use thiserror::Error;

/// Errors that can occur while building or attaching a clock.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClockError {
    /// Countdown duration is not a finite, positive number of seconds.
    #[error("Invalid countdown duration: {value} s (must be finite and greater than 0)")]
    InvalidDuration {
        /// The rejected duration in seconds.
        value: f64,
    },

    /// The driving engine refused the operation.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ClockError {
    /// Create an invalid duration error.
    #[must_use]
    pub fn invalid_duration(value: f64) -> Self {
        Self::InvalidDuration { value }
    }
}

/// A specialized `Result` type for clock operations.
pub type ClockResult<T = ()> = std::result::Result<T, ClockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClockError::invalid_duration(0.0);
        assert!(err.to_string().contains("0 s"));

        let err = ClockError::from(EngineError::Disposed);
        assert_eq!(err.to_string(), "Engine has been disposed");
    }
}
