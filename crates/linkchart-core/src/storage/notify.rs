use crate::types::StateChange;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;
use std::sync::Mutex;

/// Fan-out of [`StateChange`] notifications to any number of receivers.
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Mutex<Vec<Sender<StateChange>>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&self) -> Receiver<StateChange> {
        let (tx, rx) = unbounded();
        if let Ok(mut senders) = self.senders.lock() {
            senders.push(tx);
        }
        rx
    }

    /// Send `change` to every live receiver, dropping disconnected ones.
    pub(crate) fn notify(&self, change: StateChange) {
        let Ok(mut senders) = self.senders.lock() else {
            return;
        };
        let before = senders.len();
        senders.retain(|tx| tx.send(change).is_ok());
        if senders.len() < before {
            debug!("Pruned {} closed state subscriber(s)", before - senders.len());
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.senders.lock().map(|s| s.len()).unwrap_or(0)
    }
}
