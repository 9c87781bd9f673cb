//! Tick-scheduling engines for single-threaded, callback-driven hosts.
//!
//! An engine decides *when* and *how many times* to signal that a step
//! occurred. Three interchangeable policies implement the [`Engine`] contract:
//!
//! - **[`FastEngine`]**: variable rate. Ticks on host frames, throttled to a
//!   minimum gap, and reports the true instantaneous rate
//! - **[`PreciseEngine`]**: fixed delay. A deferred timer re-armed at a
//!   constant gap; every firing is a tick
//! - **[`StaticEngine`]**: fixed timestep. Accumulates frame time and emits
//!   exactly as many fixed steps as have elapsed, suppressing dispatch while
//!   the host is unfocused
//!
//! Every engine emits four signals: `start` once before the first `update`,
//! `update` per dispatched tick, `launch` whenever `launched` is set to
//! `true`, and `change` whenever `launched` flips.
//!
//! Host primitives are injected through the [`driver`] traits. Use
//! [`ManualHost`] to step engines deterministically and [`RealtimeHost`] to
//! run them against the wall clock.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use pacer_engine::prelude::*;
//!
//! let host = ManualHost::shared();
//! let engine = StaticEngine::new(host.clone(), host.clone(), EngineConfig::with_limit(10.0))?;
//!
//! let steps = Rc::new(Cell::new(0));
//! let s = Rc::clone(&steps);
//! engine.on(EngineEvent::Update, move || s.set(s.get() + 1));
//!
//! host.frames([0.0, 50.0, 100.0, 150.0, 220.0, 300.0]);
//! assert_eq!(steps.get(), 2);
//! # Ok::<(), EngineError>(())
//! ```
//!
//! # Threading
//!
//! Everything here is single-threaded (`Rc`, `Cell`) and
//! `!Send`. Listeners run synchronously inside the host callback and may call
//! back into the engine.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(unused_must_use)]

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod fast;
pub mod fixed_step;
pub mod precise;
pub mod signal;
pub mod stats;

pub mod prelude;

pub use config::{
    DEFAULT_MAX_CATCH_UP_STEPS, DEFAULT_STATIC_LIMIT_HZ, EngineConfig, EngineConfigBuilder,
};
pub use driver::manual::ManualHost;
pub use driver::realtime::{RealtimeHost, RealtimeHostConfig};
pub use driver::{FocusSource, FrameDriver, TimerDriver};
pub use engine::{Engine, EngineCore};
pub use error::{EngineError, EngineResult};
pub use fast::FastEngine;
pub use fixed_step::StaticEngine;
pub use precise::PreciseEngine;
pub use signal::{EngineEvent, EngineSignals, ListenerId, Signal};
pub use stats::{IntervalStats, IntervalSummary};
