//! Prelude module for common engine types.
//!
//! `use pacer_engine::prelude::*;` brings in the engine trait, the three
//! policies, both hosts and the configuration and error types.

pub use crate::config::{EngineConfig, EngineConfigBuilder};
pub use crate::driver::manual::ManualHost;
pub use crate::driver::realtime::{RealtimeHost, RealtimeHostConfig};
pub use crate::driver::{FocusSource, FrameDriver, TimerDriver};
pub use crate::engine::Engine;
pub use crate::error::{EngineError, EngineResult};
pub use crate::fast::FastEngine;
pub use crate::fixed_step::StaticEngine;
pub use crate::precise::PreciseEngine;
pub use crate::signal::{EngineEvent, EngineSignals, ListenerId};
pub use crate::stats::IntervalStats;
