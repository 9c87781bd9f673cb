//! Pending-work bookkeeping shared by the hosts.
//!
//! None of these types hold a borrow while running a callback, so callbacks
//! may freely request frames, arm timers or change focus.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::rc::Rc;

use super::{
    FocusListener, FocusSubscription, FrameCallback, FrameHandle, TimerCallback, TimerHandle,
};

/// Frame requests waiting for the next frame.
#[derive(Default)]
pub(crate) struct FrameQueue {
    next_id: Cell<u64>,
    pending: RefCell<VecDeque<(u64, FrameCallback)>>,
}

impl FrameQueue {
    pub(crate) fn request(&self, callback: FrameCallback) -> FrameHandle {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        self.pending.borrow_mut().push_back((id, callback));
        FrameHandle::new(id)
    }

    pub(crate) fn cancel(&self, handle: FrameHandle) {
        self.pending
            .borrow_mut()
            .retain(|(id, _)| *id != handle.id());
    }

    /// Mark the requests made so far as one frame's batch. Requests made
    /// while the batch runs wait for the following frame.
    pub(crate) fn batch(&self) -> FrameBatch {
        FrameBatch {
            end: self.next_id.get(),
        }
    }

    /// Remove the oldest request belonging to `batch`.
    ///
    /// Callers run one request at a time, so a panicking callback leaves the
    /// rest of the batch queued for the next frame.
    pub(crate) fn pop(&self, batch: FrameBatch) -> Option<FrameCallback> {
        let mut pending = self.pending.borrow_mut();
        match pending.front() {
            Some((id, _)) if *id < batch.end => pending.pop_front().map(|(_, callback)| callback),
            _ => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.borrow().len()
    }
}

/// Upper bound on the request ids delivered by one frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameBatch {
    end: u64,
}

/// Heap key ordered by `(deadline, seq)`, earliest first.
#[derive(Debug, Clone, Copy)]
struct TimerKey {
    deadline_ms: f64,
    seq: u64,
}

impl PartialEq for TimerKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimerKey {}

impl PartialOrd for TimerKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// BinaryHeap is a max-heap; reversed for earliest-first.
impl Ord for TimerKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline_ms
            .total_cmp(&other.deadline_ms)
            .then(self.seq.cmp(&other.seq))
            .reverse()
    }
}

/// Deferred timers with lazy cancellation.
///
/// The callback map is the source of truth; heap entries whose callback is
/// gone are discarded when they surface.
#[derive(Default)]
pub(crate) struct TimerQueue {
    next_seq: Cell<u64>,
    heap: RefCell<BinaryHeap<TimerKey>>,
    live: RefCell<HashMap<u64, TimerCallback>>,
}

impl TimerQueue {
    pub(crate) fn schedule(&self, deadline_ms: f64, callback: TimerCallback) -> TimerHandle {
        let seq = self.next_seq.get();
        self.next_seq.set(seq.wrapping_add(1));
        self.live.borrow_mut().insert(seq, callback);
        self.heap.borrow_mut().push(TimerKey { deadline_ms, seq });
        TimerHandle::new(seq)
    }

    pub(crate) fn cancel(&self, handle: TimerHandle) {
        self.live.borrow_mut().remove(&handle.id());
    }

    /// Earliest live deadline.
    pub(crate) fn next_deadline(&self) -> Option<f64> {
        let mut heap = self.heap.borrow_mut();
        let live = self.live.borrow();
        while let Some(key) = heap.peek().copied() {
            if live.contains_key(&key.seq) {
                return Some(key.deadline_ms);
            }
            heap.pop();
        }
        None
    }

    /// Remove and return the earliest timer due at or before `now_ms`.
    pub(crate) fn pop_due(&self, now_ms: f64) -> Option<(f64, TimerCallback)> {
        let mut heap = self.heap.borrow_mut();
        let mut live = self.live.borrow_mut();
        while let Some(key) = heap.peek().copied() {
            if key.deadline_ms > now_ms {
                return None;
            }
            heap.pop();
            if let Some(callback) = live.remove(&key.seq) {
                return Some((key.deadline_ms, callback));
            }
        }
        None
    }

    pub(crate) fn len(&self) -> usize {
        self.live.borrow().len()
    }
}

type SharedFocusListener = Rc<RefCell<FocusListener>>;

/// Focus flag plus its subscribers.
pub(crate) struct FocusState {
    focused: Cell<bool>,
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, SharedFocusListener)>>,
}

impl FocusState {
    pub(crate) fn new(focused: bool) -> Self {
        Self {
            focused: Cell::new(focused),
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn get(&self) -> bool {
        self.focused.get()
    }

    /// Update the flag, notifying subscribers if it changed.
    /// Returns the number of subscribers notified.
    pub(crate) fn set(&self, focused: bool) -> usize {
        if self.focused.replace(focused) == focused {
            return 0;
        }
        let snapshot: Vec<SharedFocusListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        let mut notified: usize = 0;
        for listener in snapshot {
            if let Ok(mut listener) = listener.try_borrow_mut() {
                (&mut *listener)(focused);
                notified = notified.saturating_add(1);
            }
        }
        notified
    }

    pub(crate) fn subscribe(&self, listener: FocusListener) -> FocusSubscription {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        self.listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));
        FocusSubscription::new(id)
    }

    pub(crate) fn unsubscribe(&self, subscription: FocusSubscription) {
        self.listeners
            .borrow_mut()
            .retain(|(id, _)| *id != subscription.id());
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}
