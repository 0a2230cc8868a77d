use crate::alias;
use crate::canon;
use crate::graph::types::*;
use crate::types::{EntityType, NodeId, NodeKind, Report};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Accumulates nodes and edges for one build.
struct Accumulator<'a> {
    inputs: &'a GraphInputs<'a>,
    nodes: Vec<GraphNode>,
    index: HashMap<NodeId, usize>,
    edges: Vec<GraphEdge>,
    connected: HashSet<(NodeId, NodeId)>,
}

impl<'a> Accumulator<'a> {
    fn new(inputs: &'a GraphInputs<'a>) -> Self {
        Self {
            inputs,
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            connected: HashSet::new(),
        }
    }

    /// Hidden nodes are never created unless hidden nodes are shown.
    fn admits(&self, id: &str) -> bool {
        self.inputs.visibility.show_hidden_nodes || !self.inputs.hidden.contains(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        let idx = *self.index.get(id)?;
        Some(&mut self.nodes[idx])
    }

    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn insert(&mut self, node: GraphNode) {
        if self.index.contains_key(&node.id) {
            return;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    fn pair_key(a: &str, b: &str) -> (NodeId, NodeId) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    fn is_connected(&self, a: &str, b: &str) -> bool {
        self.connected.contains(&Self::pair_key(a, b))
    }

    /// Add an edge unless the pair is already connected in either direction.
    fn connect(&mut self, source: &str, target: &str, weight: u32, is_manual: bool, counted: bool) -> bool {
        if source == target || self.is_connected(source, target) {
            return false;
        }
        self.connected.insert(Self::pair_key(source, target));
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            weight,
            is_manual,
        });
        if counted {
            for id in [source, target] {
                if let Some(node) = self.get_mut(id) {
                    node.connection_count += 1;
                }
            }
        }
        true
    }

    fn seed_manual_nodes(&mut self) {
        for manual in self.inputs.manual_nodes {
            if !self.admits(&manual.id) {
                continue;
            }
            let (subtype, source_report) = match manual.kind {
                NodeKind::Case => (None, Some(Report::placeholder(&manual.id, &manual.label))),
                NodeKind::Entity => (Some(manual.subtype.unwrap_or_default()), None),
            };
            self.insert(GraphNode {
                id: manual.id.clone(),
                kind: manual.kind,
                subtype,
                label: manual.label.clone(),
                source_report,
                connection_count: 0,
                is_manual: true,
            });
        }
    }

    fn add_case_nodes(&mut self) {
        for report in self.inputs.reports {
            let id = case_node_id(&report.id);
            if !self.admits(&id) {
                continue;
            }
            match self.get_mut(&id) {
                Some(existing) => existing.source_report = Some(report.clone()),
                None => self.insert(GraphNode {
                    id,
                    kind: NodeKind::Case,
                    subtype: None,
                    label: report.topic.clone(),
                    source_report: Some(report.clone()),
                    connection_count: 0,
                    is_manual: false,
                }),
            }
        }
    }

    fn add_parent_edges(&mut self) {
        let mut by_topic: HashMap<&str, &str> = HashMap::new();
        for report in self.inputs.reports {
            by_topic.entry(report.topic.as_str()).or_insert(report.id.as_str());
        }

        for report in self.inputs.reports {
            let Some(parent_topic) = report.parent_topic.as_deref() else {
                continue;
            };
            let Some(parent_id) = by_topic.get(parent_topic) else {
                continue;
            };
            let parent = case_node_id(parent_id);
            let child = case_node_id(&report.id);
            if self.contains(&parent) && self.contains(&child) {
                self.connect(&parent, &child, PARENT_EDGE_WEIGHT, false, false);
            }
        }
    }

    fn add_entity_mentions(&mut self) {
        for report in self.inputs.reports {
            let case_id = case_node_id(&report.id);
            if !self.contains(&case_id) {
                continue;
            }

            for entity in &report.entities {
                let cleaned = canon::clean_display(&entity.name);
                if cleaned.is_empty() {
                    continue;
                }
                let label = alias::resolve(self.inputs.aliases, &cleaned).to_string();
                let Some(entity_id) = entity_node_id(&label) else {
                    continue;
                };
                if !self.admits(&entity_id) {
                    continue;
                }

                match self.get_mut(&entity_id) {
                    Some(existing) => {
                        let current = existing.subtype.unwrap_or_default();
                        if current == EntityType::Unknown && entity.entity_type.is_known() {
                            existing.subtype = Some(entity.entity_type);
                        }
                    }
                    None => self.insert(GraphNode {
                        id: entity_id.clone(),
                        kind: NodeKind::Entity,
                        subtype: Some(entity.entity_type),
                        label,
                        source_report: None,
                        connection_count: 0,
                        is_manual: false,
                    }),
                }

                self.connect(&case_id, &entity_id, MENTION_EDGE_WEIGHT, false, true);
            }
        }
    }

    fn add_manual_connections(&mut self) {
        for link in self.inputs.manual_connections {
            if self.contains(&link.source) && self.contains(&link.target) {
                self.connect(&link.source, &link.target, MANUAL_EDGE_WEIGHT, true, true);
            }
        }
    }

    fn finish(self) -> GraphModel {
        let visibility = self.inputs.visibility;
        let flagged = self.inputs.flagged;

        let nodes: Vec<GraphNode> = if visibility.show_flagged_only {
            self.nodes
                .into_iter()
                .filter(|n| n.kind == NodeKind::Case || flagged.contains(&n.id))
                .collect()
        } else if !visibility.show_singletons {
            self.nodes
                .into_iter()
                .filter(|n| n.is_manual || n.kind == NodeKind::Case || n.connection_count > 1)
                .collect()
        } else {
            self.nodes
        };

        let surviving: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges: Vec<GraphEdge> = self
            .edges
            .into_iter()
            .filter(|e| surviving.contains(e.source.as_str()) && surviving.contains(e.target.as_str()))
            .collect();

        let report_cases: HashSet<NodeId> =
            self.inputs.reports.iter().map(|r| case_node_id(&r.id)).collect();

        let stats = GraphStats {
            reports_in_scope: nodes.iter().filter(|n| report_cases.contains(&n.id)).count(),
            entity_node_count: nodes.iter().filter(|n| n.kind == NodeKind::Entity).count(),
            edge_count: edges.len(),
            hub_count: nodes.iter().filter(|n| n.is_hub()).count(),
        };

        GraphModel { nodes, edges, stats }
    }
}

/// Build the link chart from scratch.
///
/// Pure: the same inputs always yield the same model. Callers rebuild on
/// every input change; nothing is patched incrementally.
pub fn build(inputs: &GraphInputs<'_>) -> GraphModel {
    let mut acc = Accumulator::new(inputs);
    acc.seed_manual_nodes();
    acc.add_case_nodes();
    acc.add_parent_edges();
    acc.add_entity_mentions();
    acc.add_manual_connections();
    let model = acc.finish();

    debug!(
        "Built graph: {} nodes, {} edges, {} hubs",
        model.nodes.len(),
        model.stats.edge_count,
        model.stats.hub_count
    );
    model
}
