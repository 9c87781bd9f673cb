//! Error types for the engine crate.
//!
//! Rate requests are validated without panicking: a rejected limit leaves the
//! engine's previous rate in place and reports [`EngineError::InvalidLimit`].

use thiserror::Error;

/// Errors that can occur while configuring or controlling an engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Requested tick rate is not a finite, positive frequency.
    #[error("Invalid tick rate limit: {value} Hz (must be finite and greater than 0)")]
    InvalidLimit {
        /// The rejected rate in hertz.
        value: f64,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Operation attempted on an engine whose driver loop has been torn down.
    #[error("Engine has been disposed")]
    Disposed,
}

impl EngineError {
    /// Create an invalid limit error.
    #[must_use]
    pub fn invalid_limit(value: f64) -> Self {
        Self::InvalidLimit { value }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Whether the error leaves the engine in its previous, still usable state.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Disposed)
    }
}

/// A specialized `Result` type for engine operations.
pub type EngineResult<T = ()> = std::result::Result<T, EngineError>;
