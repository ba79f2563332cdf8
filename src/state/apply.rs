//! Event application: sequence assignment and folding into state.

use std::sync::{mpsc::Receiver, Arc, Mutex};

use tracing::warn;

use crate::state::{AppState, EventBus, EventSink, StateEvent};

pub struct EventApplier {
    state: Arc<AppState>,
    receiver: Receiver<StateEvent>,
    next_seq: u64,
}

impl EventApplier {
    pub fn new(state: Arc<AppState>, receiver: Receiver<StateEvent>) -> Self {
        Self {
            state,
            receiver,
            next_seq: 1,
        }
    }

    /// Apply everything currently queued, in emit order. Returns the
    /// number of events applied.
    pub fn ingest_pending(&mut self) -> usize {
        let mut count = 0usize;
        while let Ok(event) = self.receiver.try_recv() {
            let seq = self.next_seq;
            self.state.apply(seq, event);
            self.next_seq += 1;
            count += 1;
        }
        count
    }
}

#[derive(Clone)]
pub struct SharedApplier(Arc<Mutex<EventApplier>>);

impl SharedApplier {
    pub fn new(inner: EventApplier) -> Self {
        Self(Arc::new(Mutex::new(inner)))
    }

    pub fn drain(&self) -> usize {
        let mut guard = self.0.lock().expect("applier lock poisoned");
        guard.ingest_pending()
    }
}

/// Runtime tying state, bus, and applier together. Emitting through the
/// runtime queues the event and drains the queue; ordering is the emit
/// order across all clones of the runtime.
#[derive(Clone)]
pub struct StateRuntime {
    state: Arc<AppState>,
    bus: EventBus,
    applier: SharedApplier,
}

impl StateRuntime {
    pub fn new(state: Arc<AppState>) -> Self {
        let (bus, receiver) = EventBus::new_pair();
        let applier = SharedApplier::new(EventApplier::new(Arc::clone(&state), receiver));
        Self {
            state,
            bus,
            applier,
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

impl EventSink for StateRuntime {
    fn emit(&self, event: StateEvent) {
        if let Err(err) = self.bus.emit(event) {
            warn!(error = %err, "failed to queue state event");
            return;
        }
        self.applier.drain();
    }
}
