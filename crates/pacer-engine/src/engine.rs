//! The engine contract shared by every timing policy.
//!
//! An engine owns four signals (`start`, `update`, `launch`, `change`), a
//! run/pause flag, a requested rate and the measured rate. Policies differ
//! only in how they decide that a tick occurred; the bookkeeping around a
//! tick lives in [`EngineCore`].
//!
//! All state uses `Cell`/`RefCell`, and no borrow is held while a signal is
//! emitted, so listeners may call back into the engine (toggle `launched`,
//! change the limit, connect more listeners) from inside a dispatch.

use std::cell::{Cell, RefCell};

use tracing::{debug, trace, warn};

use crate::config::{gap_ms, is_valid_limit, rate_hz};
use crate::error::{EngineError, EngineResult};
use crate::signal::{EngineEvent, EngineSignals, ListenerId};
use crate::stats::{IntervalStats, IntervalSummary};

/// Capability set every timing policy exposes.
pub trait Engine {
    /// Shared engine state.
    fn core(&self) -> &EngineCore;

    /// Tear down the driver loop. Idempotent.
    fn dispose(&self);

    /// Whether [`dispose`](Engine::dispose) has run.
    fn is_disposed(&self) -> bool {
        self.core().is_disposed()
    }

    /// Current run/pause flag.
    fn launched(&self) -> bool {
        self.core().launched()
    }

    /// Set the run/pause flag.
    ///
    /// Fires `change` if the value flips, then `launch` if `launched` is true.
    fn set_launched(&self, launched: bool) {
        self.core().set_launched(launched);
    }

    /// Requested tick rate in hertz, if any.
    fn limit(&self) -> Option<f64> {
        self.core().limit()
    }

    /// Request a tick rate in hertz.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidLimit`] for a non-finite or non-positive
    /// rate, in which case the previous rate stays in effect, and
    /// [`EngineError::Disposed`] after disposal.
    fn set_limit(&self, hz: f64) -> EngineResult<()> {
        self.core().set_limit(hz)
    }

    /// Rate derived from the most recent observed tick interval (Hz).
    fn measured_rate(&self) -> f64 {
        self.core().measured_rate()
    }

    /// Seconds per tick for the most recent tick.
    fn delta(&self) -> f64 {
        self.core().delta()
    }

    /// The engine's signals.
    fn signals(&self) -> &EngineSignals {
        self.core().signals()
    }

    /// Full copy of the engine's interval statistics, sample buffer included.
    /// Prefer [`summary`](Engine::summary) for reporting.
    fn stats(&self) -> IntervalStats {
        self.core().stats()
    }

    /// Headline counters and percentiles, computed in place.
    fn summary(&self) -> IntervalSummary {
        self.core().summary()
    }

    /// Connect a listener to `event`.
    fn on<F>(&self, event: EngineEvent, listener: F) -> ListenerId
    where
        F: FnMut() + 'static,
        Self: Sized,
    {
        self.signals().get(event).connect(listener)
    }

    /// Connect a listener to `event` that fires at most once.
    fn once<F>(&self, event: EngineEvent, listener: F) -> ListenerId
    where
        F: FnMut() + 'static,
        Self: Sized,
    {
        self.signals().get(event).connect_once(listener)
    }

    /// Disconnect a listener from `event`.
    fn off(&self, event: EngineEvent, id: ListenerId) -> bool {
        self.signals().get(event).disconnect(id)
    }
}

/// State and tick bookkeeping shared by all policies.
#[derive(Debug)]
pub struct EngineCore {
    kind: &'static str,
    signals: EngineSignals,
    /// `None` until the constructor assigns the initial flag.
    launched: Cell<Option<bool>>,
    limit: Cell<Option<f64>>,
    measured_rate: Cell<f64>,
    /// Seconds.
    delta: Cell<f64>,
    has_started: Cell<bool>,
    last_tick_ms: Cell<f64>,
    disposed: Cell<bool>,
    stats: RefCell<IntervalStats>,
}

impl EngineCore {
    pub(crate) fn new(kind: &'static str, signals: EngineSignals, limit_hz: Option<f64>) -> Self {
        Self {
            kind,
            signals,
            launched: Cell::new(None),
            limit: Cell::new(limit_hz.filter(|hz| is_valid_limit(*hz))),
            measured_rate: Cell::new(0.0),
            delta: Cell::new(0.0),
            has_started: Cell::new(false),
            last_tick_ms: Cell::new(0.0),
            disposed: Cell::new(false),
            stats: RefCell::new(IntervalStats::new()),
        }
    }

    /// Policy name used in log fields.
    #[inline]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The engine's signals.
    #[inline]
    pub fn signals(&self) -> &EngineSignals {
        &self.signals
    }

    /// Current run/pause flag.
    #[inline]
    pub fn launched(&self) -> bool {
        self.launched.get().unwrap_or(false)
    }

    /// Set the run/pause flag, emitting `change` then `launch` as required.
    pub fn set_launched(&self, launched: bool) {
        let previous = self.launched.replace(Some(launched));
        if previous != Some(launched) {
            debug!(engine = self.kind, launched, "Engine run state changed");
            self.signals.change.emit();
        }
        if launched {
            self.signals.launch.emit();
        }
    }

    /// Requested tick rate in hertz, if any.
    #[inline]
    pub fn limit(&self) -> Option<f64> {
        self.limit.get()
    }

    pub(crate) fn set_limit(&self, hz: f64) -> EngineResult<()> {
        if self.is_disposed() {
            return Err(EngineError::Disposed);
        }
        if !is_valid_limit(hz) {
            warn!(
                engine = self.kind,
                requested = hz,
                current = ?self.limit.get(),
                "Rejected invalid tick rate limit"
            );
            return Err(EngineError::invalid_limit(hz));
        }
        self.limit.set(Some(hz));
        debug!(engine = self.kind, limit_hz = hz, gap_ms = self.gap_ms(), "Tick rate limit set");
        Ok(())
    }

    /// Minimum/target inter-tick interval in milliseconds.
    #[inline]
    pub fn gap_ms(&self) -> f64 {
        gap_ms(self.limit.get())
    }

    /// Rate derived from the most recent observed tick interval (Hz).
    #[inline]
    pub fn measured_rate(&self) -> f64 {
        self.measured_rate.get()
    }

    /// Seconds per tick for the most recent tick.
    #[inline]
    pub fn delta(&self) -> f64 {
        self.delta.get()
    }

    /// Whether `start` has fired.
    #[inline]
    pub fn has_started(&self) -> bool {
        self.has_started.get()
    }

    /// Driver timestamp of the last accepted tick (ms).
    #[inline]
    pub fn last_tick_ms(&self) -> f64 {
        self.last_tick_ms.get()
    }

    pub(crate) fn set_last_tick_ms(&self, timestamp_ms: f64) {
        self.last_tick_ms.set(timestamp_ms);
    }

    /// Whether the engine has been disposed.
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Mark the engine disposed. Returns `true` if it already was.
    pub(crate) fn mark_disposed(&self) -> bool {
        let already = self.disposed.replace(true);
        if !already {
            debug!(engine = self.kind, "Engine disposed");
        }
        already
    }

    /// Full copy of the interval statistics, sample buffer included.
    pub fn stats(&self) -> IntervalStats {
        self.stats.borrow().clone()
    }

    /// Headline counters and percentiles without copying the sample buffer.
    pub fn summary(&self) -> IntervalSummary {
        self.stats.borrow_mut().summary()
    }

    /// Ticks that dispatched `update`.
    #[inline]
    pub fn dispatched_ticks(&self) -> u64 {
        self.stats.borrow().dispatched_ticks
    }

    /// Ticks or fixed steps accepted without dispatch.
    #[inline]
    pub fn suppressed_ticks(&self) -> u64 {
        self.stats.borrow().suppressed_ticks
    }

    /// Catch-up steps discarded by the step cap.
    #[inline]
    pub fn dropped_steps(&self) -> u64 {
        self.stats.borrow().dropped_steps
    }

    /// Set `delta` from a step size in milliseconds, leaving the measured
    /// rate alone.
    pub(crate) fn set_delta_ms(&self, step_ms: f64) {
        self.delta.set(step_ms / 1000.0);
    }

    /// Record a tick observed after `interval_ms` and dispatch `update`.
    pub(crate) fn dispatch_tick(&self, interval_ms: f64) {
        self.measured_rate.set(rate_hz(interval_ms));
        self.set_delta_ms(interval_ms);
        self.stats.borrow_mut().record_dispatch(interval_ms);
        trace!(engine = self.kind, interval_ms, "Dispatching update");
        self.dispatch_update();
    }

    /// Record a tick accepted while paused: the measured rate drops to zero.
    pub(crate) fn record_paused_tick(&self) {
        self.measured_rate.set(0.0);
        self.delta.set(0.0);
        self.stats.borrow_mut().record_suppressed();
    }

    /// Record a fixed step consumed without dispatch.
    pub(crate) fn record_suppressed_step(&self) {
        self.stats.borrow_mut().record_suppressed();
    }

    /// Record a fixed step of `step_ms` and dispatch `update`.
    pub(crate) fn dispatch_step(&self, step_ms: f64) {
        self.stats.borrow_mut().record_dispatch(step_ms);
        trace!(engine = self.kind, step_ms, "Dispatching fixed step");
        self.dispatch_update();
    }

    /// Record the effective step size of a frame that consumed whole steps.
    /// The measured rate stays at zero while paused.
    pub(crate) fn record_step_size(&self, step_ms: f64) {
        let rate = if self.launched() { rate_hz(step_ms) } else { 0.0 };
        self.measured_rate.set(rate);
        self.set_delta_ms(step_ms);
    }

    pub(crate) fn record_dropped_steps(&self, steps: u64) {
        self.stats.borrow_mut().record_dropped(steps);
    }

    fn dispatch_update(&self) {
        if !self.has_started.replace(true) {
            debug!(engine = self.kind, "First update, emitting start");
            self.signals.start.emit();
        }
        self.signals.update.emit();
    }
}
