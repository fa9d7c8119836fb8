use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::entities::sync::RefreshSignal;

/// Fan-out of refresh signals to every open view. Subscribers whose receiver
/// has been dropped are pruned on the next publish.
#[derive(Debug, Clone, Default)]
pub struct RefreshBus {
    subscribers: Arc<Mutex<Vec<Sender<RefreshSignal>>>>,
}

impl RefreshBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<RefreshSignal> {
        let (tx, rx) = channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Returns how many subscribers received the signal.
    pub fn publish(&self, signal: RefreshSignal) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(signal).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
