//! Ordered log of engine signal emissions.

use std::cell::RefCell;
use std::rc::Rc;

use pacer_engine::{EngineEvent, EngineSignals, ListenerId, Signal};

/// Records every emission of an engine's four signals, in order.
///
/// Attach it to an [`EngineSignals`] before handing the signals to an engine
/// constructor to capture the constructor's own `change`/`launch`. The
/// recorder disconnects its listeners when dropped.
///
/// # Example
///
/// ```rust
/// use pacer_engine::{EngineEvent, EngineSignals};
/// use pacer_test_helpers::SignalRecorder;
///
/// let signals = EngineSignals::new();
/// let recorder = SignalRecorder::attach(&signals);
/// signals.change.emit();
/// signals.launch.emit();
/// assert_eq!(recorder.events(), vec![EngineEvent::Change, EngineEvent::Launch]);
/// ```
pub struct SignalRecorder {
    log: Rc<RefCell<Vec<EngineEvent>>>,
    connections: Vec<(Signal, ListenerId)>,
}

impl SignalRecorder {
    /// Connect to all four signals.
    pub fn attach(signals: &EngineSignals) -> Self {
        let log = Rc::new(RefCell::new(Vec::new()));
        let connections = EngineEvent::ALL
            .iter()
            .map(|&event| {
                let signal = signals.get(event).clone();
                let l = Rc::clone(&log);
                let id = signal.connect(move || l.borrow_mut().push(event));
                (signal, id)
            })
            .collect();
        Self { log, connections }
    }

    /// Events recorded so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.log.borrow().clone()
    }

    /// Number of times `event` was recorded.
    pub fn count(&self, event: EngineEvent) -> usize {
        self.log.borrow().iter().filter(|&&e| e == event).count()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    /// Forget the recorded events.
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Drop for SignalRecorder {
    fn drop(&mut self) {
        for (signal, id) in &self.connections {
            signal.disconnect(*id);
        }
    }
}
