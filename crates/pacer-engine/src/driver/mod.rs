//! Host primitives the engines are driven by.
//!
//! Three seams stand in for a host's event loop:
//!
//! - [`FrameDriver`] - a frame-synchronised callback, invoked once per display
//!   refresh with a monotonically increasing timestamp in milliseconds
//! - [`TimerDriver`] - a deferred callback invoked after at least N
//!   milliseconds, plus the clock it measures against
//! - [`FocusSource`] - whether the host has input focus, and focus/blur
//!   notifications
//!
//! Two hosts implement all three: [`ManualHost`](manual::ManualHost) is
//! stepped explicitly and is the seam tests use, while
//! [`RealtimeHost`](realtime::RealtimeHost) runs a wall-clock loop on the
//! current thread.

pub mod manual;
pub mod realtime;

mod queue;

/// Callback run on the next frame with the frame timestamp (ms).
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Callback run when a deferred timer expires.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Listener notified with the new focus state whenever it changes.
pub type FocusListener = Box<dyn FnMut(bool)>;

/// Smallest delay a host grants a deferred timer (ms).
///
/// Zero and negative delays are raised to this, so a timer that re-arms
/// itself with no delay still lets the clock advance.
pub const MIN_TIMER_DELAY_MS: f64 = 1.0;

/// Normalise a requested timer delay to what a host will honour.
#[inline]
pub fn clamp_timer_delay(delay_ms: f64) -> f64 {
    if delay_ms.is_nan() {
        MIN_TIMER_DELAY_MS
    } else {
        delay_ms.max(MIN_TIMER_DELAY_MS)
    }
}

/// Handle to a pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    /// Wrap a host-assigned id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Host-assigned id.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Handle to a pending deferred timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a host-assigned id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Host-assigned id.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Handle to a focus subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusSubscription(u64);

impl FocusSubscription {
    /// Wrap a host-assigned id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Host-assigned id.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Frame-synchronised callback primitive.
///
/// Each request fires at most once, on the next frame after it was made.
pub trait FrameDriver {
    /// Run `callback` on the next frame.
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Cancel a pending request. Unknown handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

/// Deferred-callback primitive and its clock.
pub trait TimerDriver {
    /// Current host time in milliseconds.
    fn now(&self) -> f64;

    /// Run `callback` once, no earlier than `delay_ms` from now.
    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerHandle;

    /// Cancel a pending timer. Unknown handles are ignored.
    fn clear_timeout(&self, handle: TimerHandle);
}

/// Host input focus.
pub trait FocusSource {
    /// Whether the host currently has input focus.
    fn has_focus(&self) -> bool;

    /// Subscribe to focus (`true`) and blur (`false`) notifications.
    fn subscribe_focus(&self, listener: FocusListener) -> FocusSubscription;

    /// Remove a focus subscription. Unknown handles are ignored.
    fn unsubscribe_focus(&self, subscription: FocusSubscription);
}
