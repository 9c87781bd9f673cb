//! Output formatting for CLI responses

use anyhow::{Error, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use crate::commands::config::RunConfig;
use crate::commands::run::RunReport;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

pub fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        return print_json(&json!({ "success": true, "run": report }));
    }

    let limit = report
        .limit_hz
        .map_or_else(|| "unlimited".to_string(), |hz| format!("{hz} Hz"));
    println!(
        "{} {} engine, limit {}, {:.2}s",
        "Run:".bold(),
        report.policy.as_str().cyan(),
        limit,
        report.seconds
    );
    println!("  updates:        {}", report.updates.to_string().green());
    println!("  frames:         {}", report.frames_delivered);
    println!("  elapsed:        {:.4}s", report.elapsed_secs);
    println!("  measured rate:  {:.2} Hz", report.measured_rate_hz);
    println!("  average rate:   {:.2} Hz", report.stats.average_rate_hz);
    println!(
        "  interval ms:    p50 {:.3}  p95 {:.3}  p99 {:.3}  max {:.3}",
        report.stats.p50_interval_ms,
        report.stats.p95_interval_ms,
        report.stats.p99_interval_ms,
        report.stats.max_interval_ms
    );
    if report.stats.suppressed_ticks > 0 || report.stats.dropped_steps > 0 {
        println!(
            "  {} suppressed {}, dropped {}",
            "!".yellow(),
            report.stats.suppressed_ticks,
            report.stats.dropped_steps
        );
    }
    Ok(())
}

pub fn print_config(config: &RunConfig, json: bool) -> Result<()> {
    if json {
        return print_json(config);
    }

    let limit = config
        .engine
        .limit_hz
        .map_or_else(|| "unlimited".to_string(), |hz| format!("{hz} Hz"));
    let cap = config
        .engine
        .max_catch_up_steps
        .map_or_else(|| "none".to_string(), |steps| steps.to_string());
    println!("{}", "Engine:".bold());
    println!("  launch:              {}", config.engine.launch);
    println!("  limit:               {limit}");
    println!("  max catch-up steps:  {cap}");
    println!("{}", "Host:".bold());
    println!("  refresh:             {} Hz", config.host.refresh_hz);
    println!("  focused:             {}", config.host.focused);
    Ok(())
}
