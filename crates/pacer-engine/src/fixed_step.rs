//! Fixed-timestep policy with catch-up.
//!
//! Frame arrival is decoupled from step dispatch through an accumulator: each
//! frame counts the whole steps elapsed since the last consumed step and
//! consumes exactly that many. The effective step size is the elapsed time
//! divided by the step count, and is what [`delta`](Engine::delta) reports.
//!
//! Steps are consumed whether or not they are dispatched. While the host is
//! unfocused (or the engine paused) elapsed time is spent without emitting
//! `update`, so regaining focus does not release a burst of queued steps.
//!
//! A single frame consumes at most `max_catch_up_steps` steps. Any backlog
//! past the cap is dropped and the accumulator is resynchronised to the
//! frame timestamp.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::config::{DEFAULT_STATIC_LIMIT_HZ, EngineConfig};
use crate::driver::{FocusSource, FocusSubscription, FrameDriver, FrameHandle};
use crate::engine::{Engine, EngineCore};
use crate::error::EngineResult;
use crate::signal::EngineSignals;

const KIND: &str = "static";

struct StaticShared {
    core: EngineCore,
    frames: Rc<dyn FrameDriver>,
    focus: Rc<dyn FocusSource>,
    focused: Cell<bool>,
    max_catch_up_steps: Option<u32>,
    pending_frame: Cell<Option<FrameHandle>>,
    focus_subscription: Cell<Option<FocusSubscription>>,
}

impl StaticShared {
    fn arm(shared: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(shared);
        let handle = shared.frames.request_frame(Box::new(move |timestamp_ms| {
            if let Some(shared) = weak.upgrade() {
                Self::on_frame(&shared, timestamp_ms);
            }
        }));
        shared.pending_frame.set(Some(handle));
    }

    fn track_focus(shared: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(shared);
        let subscription = shared.focus.subscribe_focus(Box::new(move |focused| {
            if let Some(shared) = weak.upgrade() {
                debug!(engine = KIND, focused, "Host focus changed");
                shared.focused.set(focused);
            }
        }));
        shared.focus_subscription.set(Some(subscription));
    }

    fn on_frame(shared: &Rc<Self>, current_ms: f64) {
        shared.pending_frame.set(None);
        if shared.core.is_disposed() {
            return;
        }
        Self::arm(shared);

        let core = &shared.core;
        let difference = current_ms - core.last_tick_ms();
        let whole_steps = (difference / core.gap_ms()).floor();
        if !whole_steps.is_finite() || whole_steps < 1.0 {
            return;
        }

        let step_ms = difference / whole_steps;
        core.record_step_size(step_ms);

        let (steps, dropped) = split_backlog(whole_steps, shared.max_catch_up_steps);
        for _ in 0..steps {
            if core.is_disposed() {
                return;
            }
            core.set_last_tick_ms(core.last_tick_ms() + step_ms);
            if shared.focused.get() && core.launched() {
                core.dispatch_step(step_ms);
            } else {
                core.record_suppressed_step();
            }
        }

        if dropped > 0 {
            core.set_last_tick_ms(current_ms);
            core.record_dropped_steps(dropped);
            warn!(
                engine = KIND,
                processed = steps,
                dropped,
                step_ms,
                "Catch-up backlog exceeded cap, dropping remaining steps"
            );
        }
    }
}

/// Split `whole_steps` into the steps to process and the steps to drop.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "whole_steps is finite, integral and at least 1; the cast saturates"
)]
fn split_backlog(whole_steps: f64, cap: Option<u32>) -> (u64, u64) {
    let total = whole_steps as u64;
    match cap.map(u64::from) {
        Some(cap) if total > cap => (cap, total.saturating_sub(cap)),
        _ => (total, 0),
    }
}

/// Frame-driven engine emitting fixed steps of `1000 / limit` milliseconds.
///
/// Without a limit the engine steps at
/// [`DEFAULT_STATIC_LIMIT_HZ`](crate::config::DEFAULT_STATIC_LIMIT_HZ).
/// `update` is dispatched only while the host has focus and the engine is
/// launched.
pub struct StaticEngine {
    shared: Rc<StaticShared>,
}

impl StaticEngine {
    /// Create an engine, subscribe to focus changes and arm its frame loop.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(
        frames: Rc<dyn FrameDriver>,
        focus: Rc<dyn FocusSource>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        Self::with_signals(frames, focus, config, EngineSignals::new())
    }

    /// Create an engine emitting through `signals`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_signals(
        frames: Rc<dyn FrameDriver>,
        focus: Rc<dyn FocusSource>,
        config: EngineConfig,
        signals: EngineSignals,
    ) -> EngineResult<Self> {
        config.validate()?;
        let limit_hz = config.limit_hz.unwrap_or(DEFAULT_STATIC_LIMIT_HZ);
        let core = EngineCore::new(KIND, signals, Some(limit_hz));
        core.set_delta_ms(core.gap_ms());

        let focused = focus.has_focus();
        let shared = Rc::new(StaticShared {
            core,
            frames,
            focus,
            focused: Cell::new(focused),
            max_catch_up_steps: config.max_catch_up_steps,
            pending_frame: Cell::new(None),
            focus_subscription: Cell::new(None),
        });
        debug!(
            engine = KIND,
            limit_hz,
            launch = config.launch,
            focused,
            max_catch_up_steps = ?config.max_catch_up_steps,
            "Engine created"
        );
        StaticShared::track_focus(&shared);
        shared.core.set_launched(config.launch);
        StaticShared::arm(&shared);
        Ok(Self { shared })
    }

    /// Focus state as last reported by the host.
    pub fn focused(&self) -> bool {
        self.shared.focused.get()
    }

    /// Per-frame cap on consumed steps, `None` when unbounded.
    pub fn max_catch_up_steps(&self) -> Option<u32> {
        self.shared.max_catch_up_steps
    }
}

impl Engine for StaticEngine {
    fn core(&self) -> &EngineCore {
        &self.shared.core
    }

    /// Request a step rate; `delta` is reset to the new step size right away.
    fn set_limit(&self, hz: f64) -> EngineResult<()> {
        let core = self.core();
        core.set_limit(hz)?;
        core.set_delta_ms(core.gap_ms());
        Ok(())
    }

    fn dispose(&self) {
        if self.shared.core.mark_disposed() {
            return;
        }
        if let Some(handle) = self.shared.pending_frame.take() {
            self.shared.frames.cancel_frame(handle);
        }
        if let Some(subscription) = self.shared.focus_subscription.take() {
            self.shared.focus.unsubscribe_focus(subscription);
        }
    }
}

impl Drop for StaticEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for StaticEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticEngine")
            .field("core", &self.shared.core)
            .field("focused", &self.shared.focused.get())
            .field("max_catch_up_steps", &self.shared.max_catch_up_steps)
            .field("armed", &self.shared.pending_frame.get().is_some())
            .finish()
    }
}
