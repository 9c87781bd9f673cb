//! Deterministic host stepped by the caller.
//!
//! `ManualHost` never looks at the wall clock. Frames are delivered with
//! whatever timestamp the caller supplies and timers fire as the caller
//! advances the clock, which makes tick sequences exactly reproducible.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use pacer_engine::prelude::*;
//!
//! let host = ManualHost::shared();
//! let engine = FastEngine::new(host.clone(), EngineConfig::with_limit(30.0))?;
//!
//! host.frames([0.0, 16.0, 33.0, 50.0, 67.0]);
//! assert_eq!(engine.core().dispatched_ticks(), 1);
//! # Ok::<(), EngineError>(())
//! ```

use std::cell::Cell;
use std::rc::Rc;

use super::queue::{FocusState, FrameQueue, TimerQueue};
use super::{
    FocusListener, FocusSource, FocusSubscription, FrameCallback, FrameDriver, FrameHandle,
    TimerCallback, TimerDriver, TimerHandle, clamp_timer_delay,
};

/// Host whose frames, clock and focus are driven explicitly.
pub struct ManualHost {
    clock_ms: Cell<f64>,
    frames: FrameQueue,
    timers: TimerQueue,
    focus: FocusState,
    frames_delivered: Cell<u64>,
    timers_fired: Cell<u64>,
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualHost {
    /// Create a focused host with its clock at zero.
    pub fn new() -> Self {
        Self {
            clock_ms: Cell::new(0.0),
            frames: FrameQueue::default(),
            timers: TimerQueue::default(),
            focus: FocusState::new(true),
            frames_delivered: Cell::new(0),
            timers_fired: Cell::new(0),
        }
    }

    /// Create a host behind an `Rc`, ready to hand to engine constructors.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Current clock (ms).
    pub fn now(&self) -> f64 {
        self.clock_ms.get()
    }

    /// Deliver one frame at `timestamp_ms` to every request made before
    /// this call. Returns the number of callbacks run.
    ///
    /// The clock moves forward to `timestamp_ms` if it is behind; timers are
    /// not fired. If a callback panics, the requests it did not reach stay
    /// queued for the next frame.
    pub fn frame(&self, timestamp_ms: f64) -> usize {
        if timestamp_ms > self.clock_ms.get() {
            self.clock_ms.set(timestamp_ms);
        }
        self.frames_delivered
            .set(self.frames_delivered.get().saturating_add(1));

        let batch = self.frames.batch();
        let mut count: usize = 0;
        while let Some(callback) = self.frames.pop(batch) {
            callback(timestamp_ms);
            count = count.saturating_add(1);
        }
        count
    }

    /// Deliver a frame per timestamp, in order.
    pub fn frames<I>(&self, timestamps: I) -> usize
    where
        I: IntoIterator<Item = f64>,
    {
        timestamps.into_iter().map(|ts| self.frame(ts)).sum()
    }

    /// Advance the clock to `target_ms`, firing due timers in deadline order.
    ///
    /// The clock reads each timer's deadline while that timer runs. Timers
    /// armed by a callback fire in the same call if they fall due by
    /// `target_ms`. Returns the number of timers fired.
    pub fn advance_to(&self, target_ms: f64) -> usize {
        if !target_ms.is_finite() {
            return 0;
        }
        let mut fired: usize = 0;
        while let Some((deadline_ms, callback)) = self.timers.pop_due(target_ms) {
            if deadline_ms > self.clock_ms.get() {
                self.clock_ms.set(deadline_ms);
            }
            callback();
            fired = fired.saturating_add(1);
        }
        if target_ms > self.clock_ms.get() {
            self.clock_ms.set(target_ms);
        }
        self.timers_fired
            .set(self.timers_fired.get().saturating_add(fired as u64));
        fired
    }

    /// Advance the clock by `delta_ms`. See [`advance_to`](Self::advance_to).
    pub fn advance_by(&self, delta_ms: f64) -> usize {
        self.advance_to(self.clock_ms.get() + delta_ms)
    }

    /// Change focus, notifying subscribers if it differs.
    pub fn set_focus(&self, focused: bool) -> usize {
        self.focus.set(focused)
    }

    /// Frame requests waiting for the next frame.
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Timers not yet fired or cancelled.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_timer_deadline(&self) -> Option<f64> {
        self.timers.next_deadline()
    }

    /// Active focus subscriptions.
    pub fn focus_subscribers(&self) -> usize {
        self.focus.subscriber_count()
    }

    /// Frames delivered so far.
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.get()
    }

    /// Timers fired so far.
    pub fn timers_fired(&self) -> u64 {
        self.timers_fired.get()
    }
}

impl FrameDriver for ManualHost {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        self.frames.request(callback)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.frames.cancel(handle);
    }
}

impl TimerDriver for ManualHost {
    fn now(&self) -> f64 {
        self.clock_ms.get()
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerHandle {
        let deadline = self.clock_ms.get() + clamp_timer_delay(delay_ms);
        self.timers.schedule(deadline, callback)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.timers.cancel(handle);
    }
}

impl FocusSource for ManualHost {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_frame_runs_only_prior_requests() {
        let host = ManualHost::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::clone(&seen);
        let host_ref = Rc::new(host);
        let h = Rc::clone(&host_ref);
        host_ref.request_frame(Box::new(move |ts| {
            s.borrow_mut().push(ts);
            let s2 = Rc::clone(&s);
            h.request_frame(Box::new(move |ts| s2.borrow_mut().push(ts)));
        }));

        assert_eq!(host_ref.frame(10.0), 1);
        assert_eq!(*seen.borrow(), vec![10.0]);
        assert_eq!(host_ref.pending_frames(), 1);

        assert_eq!(host_ref.frame(20.0), 1);
        assert_eq!(*seen.borrow(), vec![10.0, 20.0]);
    }

    #[test]
    fn test_advance_fires_timers_with_clock_at_deadline() {
        let host = Rc::new(ManualHost::new());
        let seen = Rc::new(RefCell::new(Vec::new()));

        for delay in [30.0, 10.0] {
            let s = Rc::clone(&seen);
            let h = Rc::clone(&host);
            host.set_timeout(delay, Box::new(move || s.borrow_mut().push(h.now())));
        }

        assert_eq!(host.advance_to(25.0), 1);
        assert_eq!(*seen.borrow(), vec![10.0]);
        assert!((host.now() - 25.0).abs() < f64::EPSILON);

        assert_eq!(host.advance_by(10.0), 1);
        assert_eq!(*seen.borrow(), vec![10.0, 30.0]);
        assert_eq!(host.timers_fired(), 2);
    }

    #[test]
    fn test_zero_delay_timer_chain_terminates() {
        let host = Rc::new(ManualHost::new());
        let count = Rc::new(Cell::new(0u32));

        fn rearm(host: &Rc<ManualHost>, count: &Rc<Cell<u32>>) {
            let h = Rc::clone(host);
            let c = Rc::clone(count);
            host.set_timeout(
                0.0,
                Box::new(move || {
                    c.set(c.get() + 1);
                    rearm(&h, &c);
                }),
            );
        }
        rearm(&host, &count);

        host.advance_to(10.0);
        assert_eq!(count.get(), 10);
        assert_eq!(host.pending_timers(), 1);
    }

    #[test]
    fn test_cancelled_requests_do_not_run() {
        let host = ManualHost::new();
        let ran = Rc::new(Cell::new(false));
        let r = Rc::clone(&ran);
        let frame = host.request_frame(Box::new(move |_| r.set(true)));
        host.cancel_frame(frame);
        let r = Rc::clone(&ran);
        let timer = host.set_timeout(5.0, Box::new(move || r.set(true)));
        host.clear_timeout(timer);

        host.frame(16.0);
        host.advance_to(100.0);
        assert!(!ran.get());
    }

    #[test]
    fn test_focus_subscription() {
        let host = ManualHost::new();
        assert!(host.has_focus());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let sub = host.subscribe_focus(Box::new(move |f| s.borrow_mut().push(f)));

        host.set_focus(false);
        host.set_focus(false);
        host.set_focus(true);
        host.unsubscribe_focus(sub);
        host.set_focus(false);

        assert_eq!(*seen.borrow(), vec![false, true]);
        assert!(!host.has_focus());
    }

    #[test]
    fn test_non_finite_advance_is_ignored() {
        let host = ManualHost::new();
        host.set_timeout(5.0, Box::new(|| {}));
        assert_eq!(host.advance_to(f64::INFINITY), 0);
        assert_eq!(host.pending_timers(), 1);
    }
}
