//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Default cap on fixed steps processed by [`StaticEngine`](crate::StaticEngine)
/// in a single frame. Backlog beyond the cap is dropped.
pub const DEFAULT_MAX_CATCH_UP_STEPS: u32 = 240;

/// Rate used by [`StaticEngine`](crate::StaticEngine) when no limit is configured.
pub const DEFAULT_STATIC_LIMIT_HZ: f64 = 60.0;

/// Whether `hz` is an acceptable tick rate (finite and strictly positive).
#[inline]
#[must_use]
pub fn is_valid_limit(hz: f64) -> bool {
    hz.is_finite() && hz > 0.0
}

/// Minimum inter-tick gap in milliseconds for an optional rate limit.
///
/// An unset limit means "unthrottled" and yields a zero gap.
#[inline]
#[must_use]
pub fn gap_ms(limit_hz: Option<f64>) -> f64 {
    match limit_hz {
        Some(hz) if is_valid_limit(hz) => 1000.0 / hz,
        _ => 0.0,
    }
}

/// Rate in hertz observed over an interval of `interval_ms` milliseconds.
#[inline]
#[must_use]
pub fn rate_hz(interval_ms: f64) -> f64 {
    if interval_ms > 0.0 {
        1000.0 / interval_ms
    } else {
        f64::INFINITY
    }
}

/// Construction parameters shared by every engine policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial value of the run/pause flag.
    pub launch: bool,
    /// Requested tick rate in hertz. `None` leaves the engine unthrottled
    /// (fast, precise) or at [`DEFAULT_STATIC_LIMIT_HZ`] (static).
    pub limit_hz: Option<f64>,
    /// Per-frame cap on catch-up steps for the fixed-timestep policy.
    /// `None` removes the cap entirely.
    pub max_catch_up_steps: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            launch: true,
            limit_hz: None,
            max_catch_up_steps: Some(DEFAULT_MAX_CATCH_UP_STEPS),
        }
    }
}

impl EngineConfig {
    /// Configuration for an engine that starts paused.
    #[must_use]
    pub fn paused() -> Self {
        Self {
            launch: false,
            ..Self::default()
        }
    }

    /// Configuration for a running engine limited to `hz`.
    #[must_use]
    pub fn with_limit(hz: f64) -> Self {
        Self {
            limit_hz: Some(hz),
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidLimit`] for a non-finite or non-positive
    /// rate and [`EngineError::InvalidConfiguration`] for a zero step cap.
    pub fn validate(&self) -> EngineResult<()> {
        if let Some(hz) = self.limit_hz {
            if !is_valid_limit(hz) {
                return Err(EngineError::invalid_limit(hz));
            }
        }
        if self.max_catch_up_steps == Some(0) {
            return Err(EngineError::invalid_configuration(
                "max_catch_up_steps must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the initial run/pause flag.
    #[must_use]
    pub fn launch(mut self, launch: bool) -> Self {
        self.config.launch = launch;
        self
    }

    /// Set the requested tick rate in hertz.
    #[must_use]
    pub fn limit_hz(mut self, hz: f64) -> Self {
        self.config.limit_hz = Some(hz);
        self
    }

    /// Set the per-frame catch-up cap.
    #[must_use]
    pub fn max_catch_up_steps(mut self, steps: u32) -> Self {
        self.config.max_catch_up_steps = Some(steps);
        self
    }

    /// Remove the per-frame catch-up cap.
    #[must_use]
    pub fn unbounded_catch_up(mut self) -> Self {
        self.config.max_catch_up_steps = None;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> EngineResult<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
