//! `pacer run`: drive one policy on the wall clock and report its timing.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};
use pacer_clock::Stopwatch;
use pacer_engine::{
    Engine, FastEngine, IntervalSummary, PreciseEngine, RealtimeHost, StaticEngine,
};
use serde::Serialize;
use tracing::info;

use crate::commands::config::RunConfig;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Frame-driven, throttled to the limit
    Fast,
    /// Timer-driven, one tick per gap
    Precise,
    /// Frame-driven fixed timestep with catch-up
    Static,
}

impl Policy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Precise => "precise",
            Self::Static => "static",
        }
    }
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Timing policy to run
    #[arg(short, long, value_enum, default_value_t = Policy::Fast)]
    pub policy: Policy,

    /// Tick rate limit in Hz (overrides the config file)
    #[arg(short, long)]
    pub limit: Option<f64>,

    /// How long to run, in seconds
    #[arg(short, long, default_value_t = 1.0)]
    pub seconds: f64,

    /// Simulated display refresh rate in Hz (overrides the config file)
    #[arg(short, long)]
    pub refresh: Option<f64>,

    /// JSON run configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// What a run measured.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub policy: Policy,
    pub limit_hz: Option<f64>,
    pub seconds: f64,
    pub updates: u64,
    pub elapsed_secs: f64,
    pub measured_rate_hz: f64,
    pub frames_delivered: u64,
    pub stats: IntervalSummary,
}

pub fn execute(args: &RunArgs, json: bool) -> Result<()> {
    let config = resolve_config(args)?;
    let duration = run_duration(args.seconds)?;
    let report = run(args.policy, &config, duration)?;
    output::print_report(&report, json)
}

/// Merge the config file with command-line overrides.
pub fn resolve_config(args: &RunArgs) -> Result<RunConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(hz) = args.limit {
        config.engine.limit_hz = Some(hz);
    }
    if let Some(hz) = args.refresh {
        config.host.refresh_hz = hz;
    }
    config.validate()?;
    Ok(config)
}

pub fn run_duration(seconds: f64) -> Result<Duration, CliError> {
    if seconds <= 0.0 {
        return Err(CliError::InvalidArgument(format!(
            "--seconds must be greater than 0, got {seconds}"
        )));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|err| CliError::InvalidArgument(format!("--seconds {seconds}: {err}")))
}

/// Run `policy` on a fresh realtime host for `duration`.
pub fn run(policy: Policy, config: &RunConfig, duration: Duration) -> Result<RunReport, CliError> {
    let host = Rc::new(RealtimeHost::new(config.host.clone())?);
    let engine: Rc<dyn Engine> = match policy {
        Policy::Fast => Rc::new(FastEngine::new(host.clone(), config.engine.clone())?),
        Policy::Precise => Rc::new(PreciseEngine::new(host.clone(), config.engine.clone())?),
        Policy::Static => Rc::new(StaticEngine::new(
            host.clone(),
            host.clone(),
            config.engine.clone(),
        )?),
    };

    let updates = Rc::new(Cell::new(0u64));
    let counter = Rc::clone(&updates);
    engine
        .signals()
        .update
        .connect(move || counter.set(counter.get().saturating_add(1)));
    let stopwatch = Stopwatch::attach(&engine, true)?;

    info!(policy = policy.as_str(), limit_hz = ?engine.limit(), ?duration, "Running");
    host.run_for(duration);

    let report = RunReport {
        policy,
        limit_hz: engine.limit(),
        seconds: duration.as_secs_f64(),
        updates: updates.get(),
        elapsed_secs: stopwatch.elapsed(),
        measured_rate_hz: engine.measured_rate(),
        frames_delivered: host.frames_delivered(),
        stats: engine.summary(),
    };
    engine.dispose();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn args(policy: Policy) -> RunArgs {
        RunArgs {
            policy,
            limit: None,
            seconds: 1.0,
            refresh: None,
            config: None,
        }
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() -> TestResult {
        let config = resolve_config(&RunArgs {
            limit: Some(30.0),
            refresh: Some(120.0),
            ..args(Policy::Static)
        })?;

        assert_eq!(config.engine.limit_hz, Some(30.0));
        assert!((config.host.refresh_hz - 120.0).abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn invalid_limit_override_rejected() {
        let result = resolve_config(&RunArgs {
            limit: Some(0.0),
            ..args(Policy::Fast)
        });
        assert!(matches!(result, Err(CliError::Engine(_))));
    }

    #[test]
    fn run_duration_rejects_non_positive() {
        for seconds in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(run_duration(seconds), Err(CliError::InvalidArgument(_))),
                "{seconds}"
            );
        }
        assert!(matches!(run_duration(0.25), Ok(d) if d == Duration::from_millis(250)));
    }

    #[test]
    fn short_precise_run_reports_ticks() -> TestResult {
        let mut config = RunConfig::default();
        config.engine.limit_hz = Some(100.0);

        let report = run(Policy::Precise, &config, Duration::from_millis(60))?;

        assert!(report.updates >= 1);
        assert_eq!(report.updates, report.stats.dispatched_ticks);
        assert!(report.elapsed_secs > 0.0);
        assert_eq!(report.limit_hz, Some(100.0));
        Ok(())
    }

    #[test]
    fn policy_names() {
        let names: Vec<&str> = [Policy::Fast, Policy::Precise, Policy::Static]
            .into_iter()
            .map(Policy::as_str)
            .collect();
        assert_eq!(names, ["fast", "precise", "static"]);
    }
}
