//! Elapsed-time accumulation over an engine's ticks.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use pacer_engine::{Engine, EngineError, ListenerId, Signal};
use tracing::debug;

use crate::error::ClockResult;

#[derive(Debug, Default)]
struct StopwatchState {
    elapsed: Cell<f64>,
    launched: Cell<bool>,
    ticks: Cell<u64>,
}

/// Sums `engine.delta()` on every `update` while running.
///
/// The stopwatch does not keep its engine alive. Once the engine is dropped
/// the stopwatch stops accumulating and keeps its last reading.
pub struct Stopwatch {
    state: Rc<StopwatchState>,
    update: Signal,
    listener: Cell<Option<ListenerId>>,
}

impl Stopwatch {
    /// Attach a stopwatch to `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Engine`](crate::ClockError::Engine) wrapping
    /// [`EngineError::Disposed`] if the engine has been disposed.
    pub fn attach<E>(engine: &Rc<E>, launched: bool) -> ClockResult<Self>
    where
        E: Engine + ?Sized + 'static,
    {
        if engine.is_disposed() {
            return Err(EngineError::Disposed.into());
        }

        let state = Rc::new(StopwatchState {
            launched: Cell::new(launched),
            ..StopwatchState::default()
        });
        let update = engine.signals().update.clone();
        let weak_engine: Weak<E> = Rc::downgrade(engine);
        let weak_state = Rc::downgrade(&state);
        let listener = update.connect(move || {
            let (Some(engine), Some(state)) = (weak_engine.upgrade(), weak_state.upgrade()) else {
                return;
            };
            if state.launched.get() {
                state.elapsed.set(state.elapsed.get() + engine.delta());
                state.ticks.set(state.ticks.get().saturating_add(1));
            }
        });
        debug!(kind = engine.core().kind(), launched, "Stopwatch attached");

        Ok(Self {
            state,
            update,
            listener: Cell::new(Some(listener)),
        })
    }

    /// Accumulated seconds.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.state.elapsed.get()
    }

    /// Number of updates counted.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.state.ticks.get()
    }

    /// Whether the stopwatch is accumulating.
    #[inline]
    pub fn launched(&self) -> bool {
        self.state.launched.get()
    }

    /// Start or stop accumulating. The reading is kept either way.
    pub fn set_launched(&self, launched: bool) {
        self.state.launched.set(launched);
    }

    /// Zero the reading without changing the run flag.
    pub fn reset(&self) {
        self.state.elapsed.set(0.0);
        self.state.ticks.set(0);
    }

    /// Whether the stopwatch is still listening to its engine.
    pub fn is_attached(&self) -> bool {
        self.listener
            .get()
            .is_some_and(|id| self.update.is_connected(id))
    }

    /// Disconnect from the engine. Idempotent.
    pub fn detach(&self) {
        if let Some(id) = self.listener.take() {
            self.update.disconnect(id);
            debug!(elapsed = self.elapsed(), "Stopwatch detached");
        }
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stopwatch")
            .field("elapsed", &self.elapsed())
            .field("ticks", &self.ticks())
            .field("launched", &self.launched())
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacer_engine::{EngineConfig, FastEngine, ManualHost, StaticEngine};
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

    #[test]
    fn test_accumulates_fixed_steps() -> TestResult {
        let (host, engine) = fixed(10.0);
        let stopwatch = Stopwatch::attach(&engine, true)?;

        host.frames(uniform(100.0, 100.0, 5));

        assert_eq!(stopwatch.ticks(), 5);
        assert_approx_eq!(stopwatch.elapsed(), 0.5, 1e-9);
        Ok(())
    }

    #[test]
    fn test_paused_stopwatch_holds_reading() -> TestResult {
        let (host, engine) = fixed(10.0);
        let stopwatch = Stopwatch::attach(&engine, true)?;

        host.frames([100.0, 200.0]);
        stopwatch.set_launched(false);
        host.frames([300.0, 400.0]);

        assert_approx_eq!(stopwatch.elapsed(), 0.2, 1e-9);

        stopwatch.set_launched(true);
        host.frame(500.0);
        assert_approx_eq!(stopwatch.elapsed(), 0.3, 1e-9);
        Ok(())
    }

    #[test]
    fn test_reset_keeps_running() -> TestResult {
        let (host, engine) = fixed(10.0);
        let stopwatch = Stopwatch::attach(&engine, true)?;

        host.frames([100.0, 200.0]);
        stopwatch.reset();
        assert_eq!(stopwatch.ticks(), 0);
        assert!(stopwatch.elapsed().abs() < f64::EPSILON);

        host.frame(300.0);
        assert_approx_eq!(stopwatch.elapsed(), 0.1, 1e-9);
        Ok(())
    }

    #[test]
    fn test_detach_disconnects() -> TestResult {
        let (host, engine) = fixed(10.0);
        let stopwatch = Stopwatch::attach(&engine, true)?;
        assert_eq!(engine.signals().update.listener_count(), 1);

        stopwatch.detach();
        stopwatch.detach();

        assert!(!stopwatch.is_attached());
        assert_eq!(engine.signals().update.listener_count(), 0);
        host.frame(100.0);
        assert_eq!(stopwatch.ticks(), 0);
        Ok(())
    }

    #[test]
    fn test_drop_disconnects() -> TestResult {
        let (_host, engine) = fixed(10.0);
        {
            let _stopwatch = Stopwatch::attach(&engine, true)?;
            assert_eq!(engine.signals().update.listener_count(), 1);
        }
        assert_eq!(engine.signals().update.listener_count(), 0);
        Ok(())
    }

    #[test]
    fn test_attach_to_disposed_engine() {
        let host = ManualHost::shared();
        let engine = Rc::new(must(FastEngine::new(host, EngineConfig::default())));
        engine.dispose();

        let result = Stopwatch::attach(&engine, true);
        assert!(matches!(
            result,
            Err(crate::ClockError::Engine(EngineError::Disposed))
        ));
    }

    #[test]
    fn test_attach_through_trait_object() -> TestResult {
        let host = ManualHost::shared();
        let engine: Rc<dyn Engine> = Rc::new(FastEngine::new(
            host.clone(),
            EngineConfig::with_limit(10.0),
        )?);
        let stopwatch = Stopwatch::attach(&engine, true)?;

        host.frames([150.0, 300.0]);

        assert_eq!(stopwatch.ticks(), 2);
        assert_approx_eq!(stopwatch.elapsed(), 0.3, 1e-9);
        Ok(())
    }
}
