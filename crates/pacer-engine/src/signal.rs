//! Named, synchronous, multi-listener signals.
//!
//! A [`Signal`] is the publish/subscribe primitive the engines emit through.
//! Dispatch runs every listener to completion on the caller's stack, in
//! connection order. The listener list is snapshotted when an emission
//! begins: listeners connected during dispatch first run on the next
//! emission, and listeners disconnected during dispatch are not invoked.
//!
//! A listener that re-entrantly triggers its own signal is not invoked again
//! for the nested emission; every other listener is.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Identifies a connected listener for later disconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw numeric id, unique per signal.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

type Callback = Rc<RefCell<dyn FnMut()>>;

struct Listener {
    id: ListenerId,
    once: bool,
    callback: Callback,
}

struct SignalInner {
    name: &'static str,
    next_id: Cell<u64>,
    listeners: RefCell<Vec<Listener>>,
}

/// A named signal with synchronous dispatch.
///
/// Cloning a `Signal` yields another handle to the same listener list.
#[derive(Clone)]
pub struct Signal {
    inner: Rc<SignalInner>,
}

impl Signal {
    /// Create a signal with no listeners.
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                name,
                next_id: Cell::new(0),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Name of this signal.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Connect a listener invoked on every emission.
    pub fn connect<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut() + 'static,
    {
        self.add(listener, false)
    }

    /// Connect a listener that is removed right before its first invocation.
    pub fn connect_once<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut() + 'static,
    {
        self.add(listener, true)
    }

    fn add<F>(&self, listener: F, once: bool) -> ListenerId
    where
        F: FnMut() + 'static,
    {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0.wrapping_add(1));
        let callback: Callback = Rc::new(RefCell::new(listener));
        self.inner.listeners.borrow_mut().push(Listener {
            id,
            once,
            callback,
        });
        id
    }

    /// Disconnect a listener. Returns `false` if it was not connected.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        match listeners.iter().position(|l| l.id == id) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Disconnect every listener.
    pub fn clear(&self) {
        self.inner.listeners.borrow_mut().clear();
    }

    /// Number of connected listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Whether `id` is still connected.
    pub fn is_connected(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow().iter().any(|l| l.id == id)
    }

    /// Emit the signal, returning the number of listeners invoked.
    pub fn emit(&self) -> usize {
        let snapshot: Vec<ListenerId> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|l| l.id)
            .collect();

        let mut invoked: usize = 0;
        for id in snapshot {
            let Some(callback) = self.take_for_dispatch(id) else {
                continue;
            };
            match callback.try_borrow_mut() {
                Ok(mut listener) => {
                    (&mut *listener)();
                    invoked = invoked.saturating_add(1);
                }
                Err(_) => {
                    tracing::trace!(
                        signal = self.inner.name,
                        listener = id.0,
                        "Skipping re-entrant listener"
                    );
                }
            }
        }
        invoked
    }

    /// Look up a listener that is still connected, removing it if one-shot.
    fn take_for_dispatch(&self, id: ListenerId) -> Option<Callback> {
        let mut listeners = self.inner.listeners.borrow_mut();
        let index = listeners.iter().position(|l| l.id == id)?;
        if listeners.get(index)?.once {
            Some(listeners.remove(index).callback)
        } else {
            listeners.get(index).map(|l| Rc::clone(&l.callback))
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.inner.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// The four signals every engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineEvent {
    /// Fires once, immediately before the first dispatched `update`.
    Start,
    /// Fires once per accepted tick while the engine is launched.
    Update,
    /// Fires every time `launched` is set to `true`.
    Launch,
    /// Fires whenever the value of `launched` flips.
    Change,
}

impl EngineEvent {
    /// All events in declaration order.
    pub const ALL: [EngineEvent; 4] = [
        EngineEvent::Start,
        EngineEvent::Update,
        EngineEvent::Launch,
        EngineEvent::Change,
    ];

    /// Signal name for this event.
    pub fn as_str(self) -> &'static str {
        match self {
            EngineEvent::Start => "start",
            EngineEvent::Update => "update",
            EngineEvent::Launch => "launch",
            EngineEvent::Change => "change",
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signal set of one engine.
///
/// Build one up front and hand it to an engine constructor to observe the
/// signals the constructor itself emits.
#[derive(Debug, Clone)]
pub struct EngineSignals {
    /// See [`EngineEvent::Start`].
    pub start: Signal,
    /// See [`EngineEvent::Update`].
    pub update: Signal,
    /// See [`EngineEvent::Launch`].
    pub launch: Signal,
    /// See [`EngineEvent::Change`].
    pub change: Signal,
}

impl EngineSignals {
    /// Create an empty signal set.
    pub fn new() -> Self {
        Self {
            start: Signal::new(EngineEvent::Start.as_str()),
            update: Signal::new(EngineEvent::Update.as_str()),
            launch: Signal::new(EngineEvent::Launch.as_str()),
            change: Signal::new(EngineEvent::Change.as_str()),
        }
    }

    /// Signal for `event`.
    pub fn get(&self, event: EngineEvent) -> &Signal {
        match event {
            EngineEvent::Start => &self.start,
            EngineEvent::Update => &self.update,
            EngineEvent::Launch => &self.launch,
            EngineEvent::Change => &self.change,
        }
    }

    /// Total listeners across all four signals.
    pub fn total_listeners(&self) -> usize {
        EngineEvent::ALL
            .iter()
            .map(|event| self.get(*event).listener_count())
            .sum()
    }
}

impl Default for EngineSignals {
    fn default() -> Self {
        Self::new()
    }
}
