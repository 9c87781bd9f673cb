//! Error types for the pacer CLI

use pacer_clock::ClockError;
use pacer_engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io(_) => 2,
            Self::InvalidArgument(_) | Self::Engine(_) | Self::Clock(_) | Self::Json(_) => 4,
        }
    }
}
