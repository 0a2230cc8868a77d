use crate::error::Result;
use crate::types::{AliasMap, GraphState, ManualConnection, ManualNode, StateChange};
use crossbeam_channel::Receiver;

/// Read-write access to the alias map and manual-graph annotations.
///
/// Every committed write bumps the store version and notifies subscribers.
/// Readers must call [`get`](GraphStateStore::get) again after a change;
/// nothing hands out a live view.
pub trait GraphStateStore: Send + Sync {
    /// Snapshot of the current state.
    fn get(&self) -> Result<GraphState>;

    /// Read, mutate, and write back as one step.
    ///
    /// Updates are serialized: no other write lands between the read `f`
    /// sees and the write of its result. `f` returns a value and whether to
    /// commit; a discarded update writes nothing and publishes no version.
    fn update<T, F>(&self, f: F) -> Result<(T, Option<StateChange>)>
    where
        F: FnOnce(&mut GraphState) -> (T, bool);

    /// Receive a [`StateChange`] after every committed write.
    fn subscribe(&self) -> Receiver<StateChange>;

    /// Writes committed so far.
    fn version(&self) -> u64;

    // === Convenience writers ===

    /// Swap in a whole new state.
    fn replace(&self, state: GraphState) -> Result<()> {
        self.update(move |current| {
            *current = state;
            ((), true)
        })?;
        Ok(())
    }

    /// Commit the current state unchanged so subscribers re-read it.
    fn touch(&self) -> Result<()> {
        self.update(|_| ((), true))?;
        Ok(())
    }

    /// Write a full replacement alias map.
    fn replace_aliases(&self, aliases: AliasMap) -> Result<()> {
        self.update(move |state| {
            state.aliases = aliases;
            ((), true)
        })?;
        Ok(())
    }

    fn append_manual_node(&self, node: ManualNode) -> Result<()> {
        self.update(move |state| {
            state.manual_nodes.push(node);
            ((), true)
        })?;
        Ok(())
    }

    fn append_manual_connection(&self, connection: ManualConnection) -> Result<()> {
        self.update(move |state| {
            state.manual_connections.push(connection);
            ((), true)
        })?;
        Ok(())
    }

    /// Add or remove `id` from the hidden set.
    fn set_hidden(&self, id: &str, hidden: bool) -> Result<()> {
        self.update(|state| {
            if hidden {
                state.hidden.insert(id.to_string());
            } else {
                state.hidden.remove(id);
            }
            ((), true)
        })?;
        Ok(())
    }

    /// Add or remove `id` from the flagged set.
    fn set_flagged(&self, id: &str, flagged: bool) -> Result<()> {
        self.update(|state| {
            if flagged {
                state.flagged.insert(id.to_string());
            } else {
                state.flagged.remove(id);
            }
            ((), true)
        })?;
        Ok(())
    }
}
