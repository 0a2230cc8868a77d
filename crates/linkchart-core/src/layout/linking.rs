use crate::types::NodeId;
use serde::{Deserialize, Serialize};

/// Where a linking gesture stands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkState {
    #[default]
    Idle,
    AwaitingTarget { source: NodeId },
}

/// What a node click resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// Linking mode is off; the node was opened for inspection.
    Inspect(NodeId),
    SourceSelected(NodeId),
    /// The pending source was clicked again.
    Cancelled,
    /// Caller should create the connection and turn linking mode off.
    LinkRequested { source: NodeId, target: NodeId },
}

/// Click handling for one view: linking mode plus the inspected node.
#[derive(Debug, Clone, Default)]
pub struct LinkingSession {
    enabled: bool,
    state: LinkState,
    selection: Option<NodeId>,
}

impl LinkingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Flip linking mode. Either direction resets to idle.
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.state = LinkState::Idle;
    }

    pub fn click_node(&mut self, id: &str) -> ClickOutcome {
        if !self.enabled {
            self.selection = Some(id.to_string());
            return ClickOutcome::Inspect(id.to_string());
        }

        match std::mem::take(&mut self.state) {
            LinkState::Idle => {
                self.state = LinkState::AwaitingTarget {
                    source: id.to_string(),
                };
                ClickOutcome::SourceSelected(id.to_string())
            }
            LinkState::AwaitingTarget { source } if source == id => ClickOutcome::Cancelled,
            LinkState::AwaitingTarget { source } => ClickOutcome::LinkRequested {
                source,
                target: id.to_string(),
            },
        }
    }

    /// Empty-canvas click. Clears the inspected node unless linking.
    pub fn click_canvas(&mut self) -> bool {
        if self.enabled {
            return false;
        }
        self.selection.take().is_some()
    }

    pub fn pending_source(&self) -> Option<&str> {
        match &self.state {
            LinkState::AwaitingTarget { source } => Some(source),
            LinkState::Idle => None,
        }
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }
}
