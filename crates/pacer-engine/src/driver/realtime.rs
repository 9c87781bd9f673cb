//! Wall-clock host running on the current thread.
//!
//! Frames are paced at a fixed refresh rate using absolute deadlines, so the
//! refresh cadence does not drift with callback execution time. Timers are
//! kept in a min-heap and fired as their deadlines pass. Between events the
//! thread sleeps.

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::queue::{FocusState, FrameQueue, TimerQueue};
use super::{
    FocusListener, FocusSource, FocusSubscription, FrameCallback, FrameDriver, FrameHandle,
    TimerCallback, TimerDriver, TimerHandle, clamp_timer_delay,
};
use crate::error::{EngineError, EngineResult};

/// Configuration for [`RealtimeHost`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeHostConfig {
    /// Simulated display refresh rate (Hz).
    pub refresh_hz: f64,
    /// Initial focus state.
    pub focused: bool,
}

impl Default for RealtimeHostConfig {
    fn default() -> Self {
        Self {
            refresh_hz: 60.0,
            focused: true,
        }
    }
}

impl RealtimeHostConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh rate is not finite and positive.
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.refresh_hz.is_finite() && self.refresh_hz > 0.0) {
            return Err(EngineError::invalid_configuration(format!(
                "refresh_hz must be finite and greater than 0, got {}",
                self.refresh_hz
            )));
        }
        Ok(())
    }
}

/// Single-threaded host driven by the wall clock.
pub struct RealtimeHost {
    origin: Instant,
    frame_period: Duration,
    next_frame: Cell<Instant>,
    frames: FrameQueue,
    timers: TimerQueue,
    focus: FocusState,
    frames_delivered: Cell<u64>,
}

impl RealtimeHost {
    /// Create a host with its clock starting now.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: RealtimeHostConfig) -> EngineResult<Self> {
        config.validate()?;
        let origin = Instant::now();
        let frame_period = Duration::from_secs_f64(1.0 / config.refresh_hz);
        debug!(
            refresh_hz = config.refresh_hz,
            focused = config.focused,
            "Realtime host created"
        );
        Ok(Self {
            origin,
            frame_period,
            next_frame: Cell::new(origin + frame_period),
            frames: FrameQueue::default(),
            timers: TimerQueue::default(),
            focus: FocusState::new(config.focused),
            frames_delivered: Cell::new(0),
        })
    }

    /// Milliseconds since the host was created.
    pub fn now_ms(&self) -> f64 {
        self.ms_at(Instant::now())
    }

    fn ms_at(&self, instant: Instant) -> f64 {
        instant.saturating_duration_since(self.origin).as_secs_f64() * 1000.0
    }

    fn instant_at(&self, ms: f64) -> Instant {
        let offset = Duration::try_from_secs_f64(ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX);
        self.origin.checked_add(offset).unwrap_or(self.origin)
    }

    /// Change focus, notifying subscribers if it differs.
    pub fn set_focus(&self, focused: bool) -> usize {
        self.focus.set(focused)
    }

    /// Frames delivered so far.
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.get()
    }

    /// Frame requests waiting for the next frame.
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Timers not yet fired or cancelled.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Run the loop for `duration`.
    pub fn run_for(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            self.turn(Some(deadline));
        }
    }

    /// Run the loop until `is_done` returns true. The predicate is checked
    /// after every turn.
    pub fn run_until<F>(&self, mut is_done: F)
    where
        F: FnMut() -> bool,
    {
        while !is_done() {
            self.turn(None);
        }
    }

    /// One loop turn: fire due timers, deliver a frame if one is due, then
    /// sleep until the next event or `limit`.
    fn turn(&self, limit: Option<Instant>) {
        let now_ms = self.now_ms();
        while let Some((_, callback)) = self.timers.pop_due(now_ms) {
            callback();
        }

        let now = Instant::now();
        let next_frame = self.next_frame.get();
        if now >= next_frame {
            self.deliver_frame();
            let mut following = next_frame + self.frame_period;
            if following <= now {
                // Missed whole refreshes; resynchronise instead of bursting.
                trace!(
                    behind_ms = now.saturating_duration_since(next_frame).as_secs_f64() * 1000.0,
                    "Frame deadline missed"
                );
                following = now + self.frame_period;
            }
            self.next_frame.set(following);
        }

        let mut wake = self.next_frame.get();
        if let Some(deadline) = self.timers.next_deadline() {
            wake = wake.min(self.instant_at(deadline));
        }
        if let Some(limit) = limit {
            wake = wake.min(limit);
        }
        let now = Instant::now();
        if wake > now {
            thread::sleep(wake - now);
        }
    }

    fn deliver_frame(&self) {
        let timestamp = self.now_ms();
        self.frames_delivered
            .set(self.frames_delivered.get().saturating_add(1));
        let batch = self.frames.batch();
        while let Some(callback) = self.frames.pop(batch) {
            callback(timestamp);
        }
    }
}

impl FrameDriver for RealtimeHost {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        self.frames.request(callback)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.frames.cancel(handle);
    }
}

impl TimerDriver for RealtimeHost {
    fn now(&self) -> f64 {
        self.now_ms()
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerHandle {
        let deadline = self.now_ms() + clamp_timer_delay(delay_ms);
        self.timers.schedule(deadline, callback)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.timers.cancel(handle);
    }
}

impl FocusSource for RealtimeHost {
    fn has_focus(&self) -> bool {
        self.focus.get()
    }

    fn subscribe_focus(&self, listener: FocusListener) -> FocusSubscription {
        self.focus.subscribe(listener)
    }

    fn unsubscribe_focus(&self, subscription: FocusSubscription) {
        self.focus.unsubscribe(subscription);
    }
}
