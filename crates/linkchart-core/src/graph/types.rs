use crate::canon;
use crate::types::{
    AliasMap, EntityType, GraphState, ManualConnection, ManualNode, NodeId, NodeKind, Report,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Weight of a parent report -> child report edge.
pub const PARENT_EDGE_WEIGHT: u32 = 3;

/// Weight of a report -> mentioned entity edge.
pub const MENTION_EDGE_WEIGHT: u32 = 1;

/// Weight of an analyst-drawn edge.
pub const MANUAL_EDGE_WEIGHT: u32 = 4;

/// Node id for the case node of a report.
pub fn case_node_id(report_id: &str) -> NodeId {
    format!("case-{}", report_id)
}

/// Node id for an entity display name, or `None` if nothing alphanumeric is left.
pub fn entity_node_id(name: &str) -> Option<NodeId> {
    let normalized = canon::normalize_id(name);
    if normalized.is_empty() {
        None
    } else {
        Some(format!("entity-{}", normalized))
    }
}

/// A node in the link chart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,

    /// Entity type. `None` for case nodes.
    pub subtype: Option<EntityType>,

    pub label: String,

    /// Report behind a case node; a placeholder for manual case nodes.
    pub source_report: Option<Report>,

    /// Edges touching this node, manual edges included.
    pub connection_count: usize,

    pub is_manual: bool,
}

impl GraphNode {
    pub fn is_hub(&self) -> bool {
        self.connection_count > 1
    }
}

/// An undirected link-chart edge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: u32,

    /// Drawn solid instead of dashed.
    pub is_manual: bool,
}

impl GraphEdge {
    /// True if this edge joins `a` and `b` in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// Aggregate counts over the visible graph
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphStats {
    pub reports_in_scope: usize,
    pub entity_node_count: usize,
    pub edge_count: usize,
    pub hub_count: usize,
}

/// Display toggles. Applied with precedence: flagged-only, then singletons.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Visibility {
    /// Keep entity nodes with a single connection.
    pub show_singletons: bool,

    /// Admit nodes from the hidden set at all.
    pub show_hidden_nodes: bool,

    /// Keep only flagged nodes plus case nodes.
    pub show_flagged_only: bool,
}

impl Visibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_singletons(mut self, show: bool) -> Self {
        self.show_singletons = show;
        self
    }

    pub fn with_hidden_nodes(mut self, show: bool) -> Self {
        self.show_hidden_nodes = show;
        self
    }

    pub fn with_flagged_only(mut self, only: bool) -> Self {
        self.show_flagged_only = only;
        self
    }
}

/// Which reports feed the graph
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReportScope {
    #[default]
    All,
    Case(String),
}

impl ReportScope {
    pub fn from_case(case_id: Option<String>) -> Self {
        match case_id {
            Some(id) if !id.is_empty() => ReportScope::Case(id),
            _ => ReportScope::All,
        }
    }

    pub fn includes(&self, report: &Report) -> bool {
        match self {
            ReportScope::All => true,
            ReportScope::Case(id) => report.case_id.as_deref() == Some(id.as_str()),
        }
    }

    pub fn filter(&self, reports: Vec<Report>) -> Vec<Report> {
        reports.into_iter().filter(|r| self.includes(r)).collect()
    }
}

/// Everything a graph build reads. Borrowed fresh for every build.
#[derive(Debug, Clone, Copy)]
pub struct GraphInputs<'a> {
    pub reports: &'a [Report],
    pub manual_nodes: &'a [ManualNode],
    pub manual_connections: &'a [ManualConnection],
    pub aliases: &'a AliasMap,
    pub hidden: &'a HashSet<NodeId>,
    pub flagged: &'a HashSet<NodeId>,
    pub visibility: Visibility,
}

impl<'a> GraphInputs<'a> {
    pub fn new(reports: &'a [Report], state: &'a GraphState, visibility: Visibility) -> Self {
        Self {
            reports,
            manual_nodes: &state.manual_nodes,
            manual_connections: &state.manual_connections,
            aliases: &state.aliases,
            hidden: &state.hidden,
            flagged: &state.flagged,
            visibility,
        }
    }
}

/// Output of one build: nodes, edges, stats
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub stats: GraphStats,
}

impl GraphModel {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Edges touching `id`.
    pub fn edges_of<'s>(&'s self, id: &'s str) -> impl Iterator<Item = &'s GraphEdge> + 's {
        self.edges.iter().filter(move |e| e.touches(id))
    }

    /// Hub nodes, most connected first.
    pub fn hubs(&self) -> Vec<&GraphNode> {
        let mut hubs: Vec<&GraphNode> = self.nodes.iter().filter(|n| n.is_hub()).collect();
        hubs.sort_by(|a, b| {
            b.connection_count
                .cmp(&a.connection_count)
                .then_with(|| a.label.cmp(&b.label))
        });
        hubs
    }
}
