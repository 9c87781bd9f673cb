//! Countdown timers driven by an engine's ticks.
//!
//! A [`Countdown`] consumes `engine.delta()` on every `update` and fires
//! its own `tick` signal for each update it consumes. When the remaining
//! time reaches zero it fires `finish`. One-shot countdowns then stop;
//! repeating countdowns rewind by their duration, carrying any overshoot
//! into the next period, and keep running.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use pacer_engine::{Engine, EngineError, ListenerId, Signal};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ClockError, ClockResult};

/// Remaining time at or below this many seconds counts as zero.
pub const FINISH_EPSILON: f64 = 1e-9;

/// Countdown settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Length of one period in seconds.
    pub duration_secs: f64,
    /// Rewind and keep running after each finish.
    pub repeat: bool,
    /// Whether the countdown runs as soon as it is attached.
    pub launch: bool,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_secs: 1.0,
            repeat: false,
            launch: true,
        }
    }
}

impl CountdownConfig {
    /// A one-shot countdown of `duration_secs`.
    #[must_use]
    pub fn once(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            ..Self::default()
        }
    }

    /// A repeating countdown with period `duration_secs`.
    #[must_use]
    pub fn repeating(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            repeat: true,
            ..Self::default()
        }
    }

    /// Check the duration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidDuration`] unless the duration is finite
    /// and greater than zero.
    pub fn validate(&self) -> ClockResult<()> {
        if self.duration_secs.is_finite() && self.duration_secs > 0.0 {
            Ok(())
        } else {
            Err(ClockError::invalid_duration(self.duration_secs))
        }
    }
}

/// Signals owned by a countdown.
#[derive(Debug, Clone)]
pub struct CountdownSignals {
    /// Fires once per engine update consumed.
    pub tick: Signal,
    /// Fires each time the remaining time reaches zero.
    pub finish: Signal,
}

impl Default for CountdownSignals {
    fn default() -> Self {
        Self {
            tick: Signal::new("tick"),
            finish: Signal::new("finish"),
        }
    }
}

#[derive(Debug)]
struct CountdownState {
    config: CountdownConfig,
    remaining: Cell<f64>,
    launched: Cell<bool>,
    finishes: Cell<u64>,
    signals: CountdownSignals,
}

impl CountdownState {
    fn consume(&self, delta: f64) {
        if !self.launched.get() {
            return;
        }

        let duration = self.config.duration_secs;
        let mut remaining = self.remaining.get() - delta;
        let mut finished = 0u64;
        if remaining <= FINISH_EPSILON {
            if self.config.repeat {
                (remaining, finished) = rewind(remaining, duration);
            } else {
                remaining = 0.0;
                finished = 1;
                self.launched.set(false);
            }
        }
        self.remaining.set(remaining);
        self.finishes
            .set(self.finishes.get().saturating_add(finished));

        self.signals.tick.emit();
        for _ in 0..finished {
            self.signals.finish.emit();
        }
        if finished > 0 {
            trace!(finished, remaining, repeat = self.config.repeat, "Countdown finished");
        }
    }
}

/// Add whole periods to an exhausted `remaining` until it is positive again.
///
/// Returns the new remaining time and the number of periods added. A long
/// delta may span several periods.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "periods is a finite whole number of at least 1"
)]
fn rewind(remaining: f64, duration: f64) -> (f64, u64) {
    let mut periods = (-remaining / duration).floor().max(0.0) + 1.0;
    let mut rewound = remaining + periods * duration;
    if rewound <= FINISH_EPSILON {
        periods += 1.0;
        rewound += duration;
    }
    (rewound, periods as u64)
}

/// One-shot or repeating timer over an engine.
///
/// Like [`Stopwatch`](crate::Stopwatch), a countdown holds only a weak
/// reference to its engine and disconnects itself when dropped.
pub struct Countdown {
    state: Rc<CountdownState>,
    update: Signal,
    listener: Cell<Option<ListenerId>>,
}

impl Countdown {
    /// Attach a countdown to `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidDuration`] for a bad duration and
    /// [`ClockError::Engine`] if the engine has been disposed.
    pub fn attach<E>(engine: &Rc<E>, config: CountdownConfig) -> ClockResult<Self>
    where
        E: Engine + ?Sized + 'static,
    {
        config.validate()?;
        if engine.is_disposed() {
            return Err(EngineError::Disposed.into());
        }

        let state = Rc::new(CountdownState {
            config,
            remaining: Cell::new(config.duration_secs),
            launched: Cell::new(config.launch),
            finishes: Cell::new(0),
            signals: CountdownSignals::default(),
        });
        let update = engine.signals().update.clone();
        let weak_engine: Weak<E> = Rc::downgrade(engine);
        let weak_state = Rc::downgrade(&state);
        let listener = update.connect(move || {
            if let (Some(engine), Some(state)) = (weak_engine.upgrade(), weak_state.upgrade()) {
                state.consume(engine.delta());
            }
        });
        debug!(
            duration_secs = config.duration_secs,
            repeat = config.repeat,
            "Countdown attached"
        );

        Ok(Self {
            state,
            update,
            listener: Cell::new(Some(listener)),
        })
    }

    /// The countdown's settings.
    pub fn config(&self) -> &CountdownConfig {
        &self.state.config
    }

    /// Length of one period in seconds.
    pub fn duration(&self) -> f64 {
        self.state.config.duration_secs
    }

    /// Whether the countdown rewinds after finishing.
    pub fn repeat(&self) -> bool {
        self.state.config.repeat
    }

    /// Seconds left in the current period.
    pub fn remaining(&self) -> f64 {
        self.state.remaining.get()
    }

    /// Fraction of the current period that has elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        (1.0 - self.remaining() / self.duration()).clamp(0.0, 1.0)
    }

    /// Number of times `finish` has fired.
    pub fn finishes(&self) -> u64 {
        self.state.finishes.get()
    }

    /// Whether a one-shot countdown has run out.
    pub fn is_finished(&self) -> bool {
        !self.repeat() && self.remaining() <= FINISH_EPSILON
    }

    /// Whether the countdown is consuming ticks.
    pub fn launched(&self) -> bool {
        self.state.launched.get()
    }

    /// Pause or resume. Resuming a finished one-shot countdown has no effect
    /// until [`restart`](Countdown::restart).
    pub fn set_launched(&self, launched: bool) {
        self.state.launched.set(launched && !self.is_finished());
    }

    /// Rewind to a full period and run.
    pub fn restart(&self) {
        self.state.remaining.set(self.duration());
        self.state.launched.set(true);
    }

    /// The countdown's `tick` and `finish` signals.
    pub fn signals(&self) -> &CountdownSignals {
        &self.state.signals
    }

    /// Whether the countdown is still listening to its engine.
    pub fn is_attached(&self) -> bool {
        self.listener
            .get()
            .is_some_and(|id| self.update.is_connected(id))
    }

    /// Disconnect from the engine. Idempotent.
    pub fn detach(&self) {
        if let Some(id) = self.listener.take() {
            self.update.disconnect(id);
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Countdown")
            .field("config", self.config())
            .field("remaining", &self.remaining())
            .field("launched", &self.launched())
            .field("finishes", &self.finishes())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacer_engine::{EngineConfig, ManualHost, StaticEngine};
    use pacer_test_helpers::prelude::*;

    fn fixed(limit_hz: f64) -> (Rc<ManualHost>, Rc<StaticEngine>) {
        let host = ManualHost::shared();
        let engine = must(StaticEngine::new(
            host.clone(),
            host.clone(),
            EngineConfig::with_limit(limit_hz),
        ));
        (host, Rc::new(engine))
    }

    fn counter(signal: &Signal) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        signal.connect(move || c.set(c.get() + 1));
        count
    }

    #[test]
    fn test_rewind_counts_periods() {
        let (remaining, periods) = rewind(-0.25, 0.1);
        assert_eq!(periods, 3);
        assert_approx_eq!(remaining, 0.05, 1e-12);

        let (remaining, periods) = rewind(0.0, 0.5);
        assert_eq!(periods, 1);
        assert_approx_eq!(remaining, 0.5, 1e-12);
    }

    #[test]
    fn test_config_validation() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = CountdownConfig::once(bad).validate();
            assert!(matches!(result, Err(ClockError::InvalidDuration { .. })));
        }
        assert!(matches!(CountdownConfig::repeating(0.5).validate(), Ok(())));
    }

    #[test]
    fn test_one_shot_finishes_and_stops() -> TestResult {
        let (host, engine) = fixed(10.0);
        let countdown = Countdown::attach(&engine, CountdownConfig::once(0.3))?;
        let ticks = counter(&countdown.signals().tick);
        let finishes = counter(&countdown.signals().finish);

        host.frames(uniform(100.0, 100.0, 5));

        assert_eq!(ticks.get(), 3);
        assert_eq!(finishes.get(), 1);
        assert!(countdown.is_finished());
        assert!(!countdown.launched());
        assert!(countdown.remaining().abs() < f64::EPSILON);
        assert_approx_eq!(countdown.progress(), 1.0, 1e-12);
        Ok(())
    }

    #[test]
    fn test_repeating_keeps_overshoot() -> TestResult {
        let host = ManualHost::shared();
        let engine = Rc::new(pacer_engine::FastEngine::new(
            host.clone(),
            EngineConfig::default(),
        )?);
        let countdown = Countdown::attach(&engine, CountdownConfig::repeating(0.25))?;
        let finishes = counter(&countdown.signals().finish);

        // 0.3 s consumed: one finish, 0.05 s overshoot carried.
        host.frame(300.0);
        assert_eq!(finishes.get(), 1);
        assert_approx_eq!(countdown.remaining(), 0.2, 1e-9);

        host.frame(500.0);
        assert_eq!(finishes.get(), 2);
        assert_approx_eq!(countdown.remaining(), 0.25, 1e-9);
        assert!(countdown.launched());
        Ok(())
    }

    #[test]
    fn test_long_delta_spans_several_periods() -> TestResult {
        let host = ManualHost::shared();
        let engine = Rc::new(pacer_engine::FastEngine::new(
            host.clone(),
            EngineConfig::default(),
        )?);
        let countdown = Countdown::attach(&engine, CountdownConfig::repeating(0.1))?;

        host.frame(350.0);

        assert_eq!(countdown.finishes(), 3);
        assert_approx_eq!(countdown.remaining(), 0.05, 1e-9);
        Ok(())
    }

    #[test]
    fn test_progress_tracks_remaining() -> TestResult {
        let (host, engine) = fixed(10.0);
        let countdown = Countdown::attach(&engine, CountdownConfig::once(1.0))?;

        assert!(countdown.progress().abs() < f64::EPSILON);
        host.frames(uniform(100.0, 100.0, 4));
        assert_approx_eq!(countdown.progress(), 0.4, 1e-9);
        Ok(())
    }

    #[test]
    fn test_paused_countdown_ignores_updates() -> TestResult {
        let (host, engine) = fixed(10.0);
        let config = CountdownConfig {
            launch: false,
            ..CountdownConfig::once(0.5)
        };
        let countdown = Countdown::attach(&engine, config)?;
        let ticks = counter(&countdown.signals().tick);

        host.frames(uniform(100.0, 100.0, 3));
        assert_eq!(ticks.get(), 0);
        assert_approx_eq!(countdown.remaining(), 0.5, 1e-12);

        countdown.set_launched(true);
        host.frame(400.0);
        assert_eq!(ticks.get(), 1);
        assert_approx_eq!(countdown.remaining(), 0.4, 1e-9);
        Ok(())
    }

    #[test]
    fn test_restart_after_finish() -> TestResult {
        let (host, engine) = fixed(10.0);
        let countdown = Countdown::attach(&engine, CountdownConfig::once(0.1))?;

        host.frame(100.0);
        assert!(countdown.is_finished());
        countdown.set_launched(true);
        assert!(!countdown.launched());

        countdown.restart();
        host.frame(200.0);
        assert_eq!(countdown.finishes(), 2);
        Ok(())
    }

    #[test]
    fn test_detach_and_disposed_engine() -> TestResult {
        let (host, engine) = fixed(10.0);
        let countdown = Countdown::attach(&engine, CountdownConfig::once(1.0))?;
        countdown.detach();
        host.frame(100.0);
        assert_approx_eq!(countdown.remaining(), 1.0, 1e-12);
        assert!(!countdown.is_attached());

        engine.dispose();
        let result = Countdown::attach(&engine, CountdownConfig::once(1.0));
        assert!(matches!(result, Err(ClockError::Engine(EngineError::Disposed))));
        Ok(())
    }
}
