//! `pacer config`: print or check a run configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use pacer_engine::{EngineConfig, RealtimeHostConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CliError;
use crate::output;

/// Contents of a `--config` file. Missing sections take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub engine: EngineConfig,
    pub host: RealtimeHostConfig,
}

impl RunConfig {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), ?config, "Loaded run configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CliError> {
        self.engine.validate()?;
        self.host.validate()?;
        Ok(())
    }
}

/// Print the default configuration, or validate `check` and echo it back.
pub fn execute(check: Option<&PathBuf>, json: bool) -> Result<()> {
    let config = match check {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    output::print_config(&config, json)
}
