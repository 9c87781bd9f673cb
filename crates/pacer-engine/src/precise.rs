//! Fixed-delay policy: a deferred timer re-armed at a constant gap.
//!
//! Every firing measures the interval since the previous one and re-arms the
//! next timer at the current gap. There is no throttling test here: the
//! timer already enforces the minimum spacing. The next timer is armed before
//! `update` is dispatched, so listener run time does not push the schedule
//! back, but the delay is not corrected for late or coalesced host timers.
//! The achieved rate then drifts below the request, and
//! [`measured_rate`](Engine::measured_rate) shows by how much.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::config::EngineConfig;
use crate::driver::{TimerDriver, TimerHandle};
use crate::engine::{Engine, EngineCore};
use crate::error::EngineResult;
use crate::signal::EngineSignals;

const KIND: &str = "precise";

struct PreciseShared {
    core: EngineCore,
    timers: Rc<dyn TimerDriver>,
    pending: Cell<Option<TimerHandle>>,
}

impl PreciseShared {
    fn arm(shared: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(shared);
        let handle = shared.timers.set_timeout(
            shared.core.gap_ms(),
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Self::on_timer(&shared);
                }
            }),
        );
        shared.pending.set(Some(handle));
    }

    fn on_timer(shared: &Rc<Self>) {
        shared.pending.set(None);
        if shared.core.is_disposed() {
            return;
        }
        // Read the clock before arming so the next interval is never shorter
        // than the gap. A limit set by a listener below applies from the
        // firing after next.
        let current_ms = shared.timers.now();
        Self::arm(shared);

        let core = &shared.core;
        let difference = current_ms - core.last_tick_ms();
        core.set_last_tick_ms(current_ms);
        if core.launched() {
            core.dispatch_tick(difference);
        } else {
            core.record_paused_tick();
        }
    }
}

/// Timer-driven engine firing every `1000 / limit` milliseconds.
///
/// With no limit the timer re-arms as fast as the host allows. Dropping the
/// engine clears its pending timer.
pub struct PreciseEngine {
    shared: Rc<PreciseShared>,
}

impl PreciseEngine {
    /// Create an engine and arm its first timer.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(timers: Rc<dyn TimerDriver>, config: EngineConfig) -> EngineResult<Self> {
        Self::with_signals(timers, config, EngineSignals::new())
    }

    /// Create an engine emitting through `signals`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_signals(
        timers: Rc<dyn TimerDriver>,
        config: EngineConfig,
        signals: EngineSignals,
    ) -> EngineResult<Self> {
        config.validate()?;
        let core = EngineCore::new(KIND, signals, config.limit_hz);
        core.set_last_tick_ms(timers.now());
        let shared = Rc::new(PreciseShared {
            core,
            timers,
            pending: Cell::new(None),
        });
        debug!(engine = KIND, limit_hz = ?config.limit_hz, launch = config.launch, "Engine created");
        shared.core.set_launched(config.launch);
        PreciseShared::arm(&shared);
        Ok(Self { shared })
    }
}

impl Engine for PreciseEngine {
    fn core(&self) -> &EngineCore {
        &self.shared.core
    }

    fn dispose(&self) {
        if self.shared.core.mark_disposed() {
            return;
        }
        if let Some(handle) = self.shared.pending.take() {
            self.shared.timers.clear_timeout(handle);
        }
    }
}

impl Drop for PreciseEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for PreciseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreciseEngine")
            .field("core", &self.shared.core)
            .field("armed", &self.shared.pending.get().is_some())
            .finish()
    }
}
