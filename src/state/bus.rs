//! In-process event bus for state-mutation events.

use std::sync::mpsc::{channel, Receiver, SendError, Sender};

use crate::state::StateEvent;

#[derive(Clone)]
pub struct EventBus {
    sender: Sender<StateEvent>,
}

impl EventBus {
    pub fn new_pair() -> (Self, Receiver<StateEvent>) {
        let (sender, receiver) = channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: StateEvent) -> Result<(), SendError<StateEvent>> {
        self.sender.send(event)
    }
}
