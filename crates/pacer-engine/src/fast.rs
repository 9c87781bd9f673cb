//! Variable-rate policy: throttled frame-sync ticks.
//!
//! Every frame the engine compares the frame timestamp with the last accepted
//! tick. Frames that arrive within the gap are skipped without moving the
//! reference point, so dispatched updates are always separated by more than
//! the gap. The measured rate reports the interval actually observed, which
//! is never faster than requested but may be slower than the frame rate
//! allows.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::config::EngineConfig;
use crate::driver::{FrameDriver, FrameHandle};
use crate::engine::{Engine, EngineCore};
use crate::error::EngineResult;
use crate::signal::EngineSignals;

const KIND: &str = "fast";

struct FastShared {
    core: EngineCore,
    frames: Rc<dyn FrameDriver>,
    pending: Cell<Option<FrameHandle>>,
}

impl FastShared {
    fn arm(shared: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(shared);
        let handle = shared.frames.request_frame(Box::new(move |timestamp_ms| {
            if let Some(shared) = weak.upgrade() {
                Self::on_frame(&shared, timestamp_ms);
            }
        }));
        shared.pending.set(Some(handle));
    }

    fn on_frame(shared: &Rc<Self>, current_ms: f64) {
        shared.pending.set(None);
        if shared.core.is_disposed() {
            return;
        }
        Self::arm(shared);

        let core = &shared.core;
        let difference = current_ms - core.last_tick_ms();
        if difference.is_nan() || difference <= core.gap_ms() {
            return;
        }
        core.set_last_tick_ms(current_ms);
        if core.launched() {
            core.dispatch_tick(difference);
        } else {
            core.record_paused_tick();
        }
    }
}

/// Frame-driven engine throttled to at most `limit` ticks per second.
///
/// With no limit the engine ticks on every frame whose timestamp advanced.
/// Dropping the engine stops its frame loop.
pub struct FastEngine {
    shared: Rc<FastShared>,
}

impl FastEngine {
    /// Create an engine and arm its frame loop.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(frames: Rc<dyn FrameDriver>, config: EngineConfig) -> EngineResult<Self> {
        Self::with_signals(frames, config, EngineSignals::new())
    }

    /// Create an engine emitting through `signals`.
    ///
    /// Listeners already connected observe the `change` (and `launch`)
    /// emitted while the engine is constructed.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_signals(
        frames: Rc<dyn FrameDriver>,
        config: EngineConfig,
        signals: EngineSignals,
    ) -> EngineResult<Self> {
        config.validate()?;
        let shared = Rc::new(FastShared {
            core: EngineCore::new(KIND, signals, config.limit_hz),
            frames,
            pending: Cell::new(None),
        });
        debug!(engine = KIND, limit_hz = ?config.limit_hz, launch = config.launch, "Engine created");
        shared.core.set_launched(config.launch);
        FastShared::arm(&shared);
        Ok(Self { shared })
    }
}

impl Engine for FastEngine {
    fn core(&self) -> &EngineCore {
        &self.shared.core
    }

    fn dispose(&self) {
        if self.shared.core.mark_disposed() {
            return;
        }
        if let Some(handle) = self.shared.pending.take() {
            self.shared.frames.cancel_frame(handle);
        }
    }
}

impl Drop for FastEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for FastEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEngine")
            .field("core", &self.shared.core)
            .field("armed", &self.shared.pending.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::manual::ManualHost;
    use crate::error::EngineError;
    use crate::signal::EngineEvent;
    use std::cell::RefCell;

    fn record_updates(engine: &FastEngine, host: &Rc<ManualHost>) -> Rc<RefCell<Vec<f64>>> {
        let times = Rc::new(RefCell::new(Vec::new()));
        let t = Rc::clone(&times);
        let h = Rc::clone(host);
        engine.on(EngineEvent::Update, move || t.borrow_mut().push(h.now()));
        times
    }

    #[test]
    fn test_throttles_to_limit() -> EngineResult<()> {
        let host = ManualHost::shared();
        let engine = FastEngine::new(host.clone(), EngineConfig::with_limit(30.0))?;
        let updates = record_updates(&engine, &host);

        host.frames([0.0, 16.0, 33.0, 50.0, 67.0]);

        assert_eq!(*updates.borrow(), vec![50.0]);
        assert!((engine.measured_rate() - 20.0).abs() < 1e-9);
        assert!((engine.delta() - 0.05).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_unthrottled_ticks_every_advancing_frame() -> EngineResult<()> {
        let host = ManualHost::shared();
        let engine = FastEngine::new(host.clone(), EngineConfig::default())?;
        let updates = record_updates(&engine, &host);

        host.frames([0.0, 16.0, 16.0, 32.0]);

        assert_eq!(*updates.borrow(), vec![16.0, 32.0]);
        Ok(())
    }

    #[test]
    fn test_paused_frames_advance_reference_without_dispatch() -> EngineResult<()> {
        let host = ManualHost::shared();
        let config = EngineConfig::builder().launch(false).limit_hz(10.0).build()?;
        let engine = FastEngine::new(host.clone(), config)?;
        let updates = record_updates(&engine, &host);

        host.frames([150.0, 200.0]);
        assert!(updates.borrow().is_empty());
        assert!(engine.measured_rate().abs() < f64::EPSILON);
        assert!((engine.core().last_tick_ms() - 150.0).abs() < f64::EPSILON);

        engine.set_launched(true);
        host.frames([240.0, 251.0]);
        assert_eq!(*updates.borrow(), vec![251.0]);
        assert_eq!(engine.core().suppressed_ticks(), 1);
        Ok(())
    }

    #[test]
    fn test_invalid_limit_keeps_gap() -> EngineResult<()> {
        let host = ManualHost::shared();
        let engine = FastEngine::new(host.clone(), EngineConfig::with_limit(10.0))?;

        assert!(matches!(
            engine.set_limit(f64::NAN),
            Err(EngineError::InvalidLimit { .. })
        ));
        assert_eq!(engine.limit(), Some(10.0));
        assert!((engine.core().gap_ms() - 100.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let host = ManualHost::shared();
        let result = FastEngine::new(host, EngineConfig::with_limit(-1.0));
        assert!(matches!(result, Err(EngineError::InvalidLimit { .. })));
    }

    #[test]
    fn test_dispose_cancels_pending_frame() -> EngineResult<()> {
        let host = ManualHost::shared();
        let engine = FastEngine::new(host.clone(), EngineConfig::default())?;
        let updates = record_updates(&engine, &host);
        assert_eq!(host.pending_frames(), 1);

        engine.dispose();
        engine.dispose();

        assert!(engine.is_disposed());
        assert_eq!(host.pending_frames(), 0);
        host.frames([16.0, 32.0]);
        assert!(updates.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn test_drop_stops_loop() -> EngineResult<()> {
        let host = ManualHost::shared();
        let engine = FastEngine::new(host.clone(), EngineConfig::default())?;
        drop(engine);
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.frame(16.0), 0);
        Ok(())
    }

    #[test]
    fn test_rearmed_before_dispatch() -> EngineResult<()> {
        let host = ManualHost::shared();
        let engine = FastEngine::new(host.clone(), EngineConfig::default())?;
        let pending_during_update = Rc::new(Cell::new(0));
        let p = Rc::clone(&pending_during_update);
        let h = Rc::clone(&host);
        engine.on(EngineEvent::Update, move || p.set(h.pending_frames()));

        host.frame(16.0);

        assert_eq!(pending_during_update.get(), 1);
        Ok(())
    }
}
