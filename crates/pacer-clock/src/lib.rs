//! Stopwatch and countdown timers driven by pacer engines.
//!
//! Both clocks listen to an engine's `update` signal and advance by
//! `engine.delta()`, so they run at whatever cadence the engine's policy
//! produces and stop with the engine.
//!
//! ```
//! use std::rc::Rc;
//! use pacer_clock::{Countdown, CountdownConfig, Stopwatch};
//! use pacer_engine::{EngineConfig, ManualHost, StaticEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let host = ManualHost::shared();
//! let engine = Rc::new(StaticEngine::new(
//!     host.clone(),
//!     host.clone(),
//!     EngineConfig::with_limit(10.0),
//! )?);
//! let stopwatch = Stopwatch::attach(&engine, true)?;
//! let countdown = Countdown::attach(&engine, CountdownConfig::once(0.2))?;
//!
//! host.frames([100.0, 200.0, 300.0]);
//!
//! assert!((stopwatch.elapsed() - 0.3).abs() < 1e-9);
//! assert!(countdown.is_finished());
//! # Ok(())
//! # }
//! ```

pub mod countdown;
pub mod error;
pub mod stopwatch;

pub use countdown::{Countdown, CountdownConfig, CountdownSignals, FINISH_EPSILON};
pub use error::{ClockError, ClockResult};
pub use stopwatch::Stopwatch;
