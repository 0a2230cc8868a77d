use crate::error::{LinkchartError, Result};
use crate::storage::notify::Subscribers;
use crate::storage::traits::GraphStateStore;
use crate::types::{GraphState, StateChange};
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// In-process state store. Used by tests and as the default when no data
/// directory is configured.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: RwLock<GraphState>,
    version: AtomicU64,
    subscribers: Subscribers,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: GraphState) -> Self {
        Self {
            state: RwLock::new(state),
            ..Self::default()
        }
    }
}

impl GraphStateStore for MemoryStateStore {
    fn get(&self) -> Result<GraphState> {
        let state = self.state.read().map_err(|_| LinkchartError::LockPoisoned)?;
        Ok(state.clone())
    }

    fn update<T, F>(&self, f: F) -> Result<(T, Option<StateChange>)>
    where
        F: FnOnce(&mut GraphState) -> (T, bool),
    {
        // Held until subscribers are notified so versions go out in order.
        let mut current = self.state.write().map_err(|_| LinkchartError::LockPoisoned)?;
        let mut next = current.clone();
        let (value, commit) = f(&mut next);
        if !commit {
            return Ok((value, None));
        }

        *current = next;
        let change = StateChange {
            version: self.version.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.subscribers.notify(change);
        Ok((value, Some(change)))
    }

    fn subscribe(&self) -> Receiver<StateChange> {
        self.subscribers.subscribe()
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}
