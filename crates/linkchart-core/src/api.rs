use crate::alias::{self, IgnoreList};
use crate::archive::ReportArchive;
use crate::canon;
use crate::cluster::{Cluster, ClusterDetector, Detection};
use crate::config::{LayoutConfig, ResolutionConfig};
use crate::error::{LinkchartError, Result};
use crate::graph::{self, entity_node_id, GraphInputs, GraphModel, ReportScope, Visibility};
use crate::layout::{ClickOutcome, ForceSimulation, LinkingSession};
use crate::storage::{GraphStateStore, RedbStateStore};
use crate::types::{
    Entity, EntityType, ManualConnection, ManualNode, NodeKind, Report, StateChange,
};
use crossbeam_channel::Receiver;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Config for embedded library mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub resolution: ResolutionConfig,
    pub layout: LayoutConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.resolution.validate()?;
        self.layout.validate()
    }
}

/// One report mentioning an entity node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mention {
    pub report_id: String,
    pub topic: String,
    pub entity: Entity,
}

/// What a clicked node refers to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeDetails {
    Case {
        report: Report,
        is_manual: bool,
    },
    Entity {
        label: String,
        subtype: EntityType,
        connection_count: usize,
        is_manual: bool,
        mentions: Vec<Mention>,
    },
}

/// High-level engine facade: duplicate resolution, graph building, and the
/// manual-linking interaction over an injected state store and archive.
///
/// # Example
/// ```rust,no_run
/// use linkchart_core::{EngineConfig, Linkchart, MemoryArchive, ReportScope, Visibility};
/// use std::sync::Arc;
///
/// let archive = Arc::new(MemoryArchive::default());
/// let engine = Linkchart::open("./linkchart.redb", archive, EngineConfig::default()).unwrap();
/// let detection = engine.detect_clusters().unwrap();
/// engine.merge_clusters(&detection.clusters).unwrap();
/// let graph = engine.build_graph(&ReportScope::All, Visibility::new()).unwrap();
/// ```
pub struct Linkchart<S: GraphStateStore, A: ReportArchive> {
    store: Arc<S>,
    archive: Arc<A>,
    detector: ClusterDetector,
    config: EngineConfig,

    /// Session-scoped: dismissed clusters come back after a restart.
    ignored: Mutex<IgnoreList>,
    linking: Mutex<LinkingSession>,
}

impl<A: ReportArchive> Linkchart<RedbStateStore, A> {
    /// Open (or create) a state database at the given path.
    pub fn open(path: impl AsRef<Path>, archive: Arc<A>, config: EngineConfig) -> Result<Self> {
        let store = Arc::new(RedbStateStore::open(path)?);
        Self::new(store, archive, config)
    }
}

impl<S: GraphStateStore, A: ReportArchive> Linkchart<S, A> {
    pub fn new(store: Arc<S>, archive: Arc<A>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            archive,
            detector: ClusterDetector::new(config.resolution.clone()),
            config,
            ignored: Mutex::new(IgnoreList::new()),
            linking: Mutex::new(LinkingSession::new()),
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn archive(&self) -> &Arc<A> {
        &self.archive
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn subscribe(&self) -> Receiver<StateChange> {
        self.store.subscribe()
    }

    fn ignored(&self) -> Result<MutexGuard<'_, IgnoreList>> {
        self.ignored.lock().map_err(|_| LinkchartError::LockPoisoned)
    }

    fn linking(&self) -> Result<MutexGuard<'_, LinkingSession>> {
        self.linking.lock().map_err(|_| LinkchartError::LockPoisoned)
    }

    // --- Resolution ---

    /// Every raw entity name across the archive, duplicates included.
    pub fn entity_names(&self) -> Result<Vec<String>> {
        Ok(self
            .archive
            .reports()?
            .into_iter()
            .flat_map(|r| r.entities.into_iter().map(|e| e.name))
            .collect())
    }

    /// Run duplicate detection against the current alias map and ignore list.
    pub fn detect_clusters(&self) -> Result<Detection> {
        let names = self.entity_names()?;
        let state = self.store.get()?;
        let ignored = self.ignored()?;
        Ok(self.detector.detect(names, &state.aliases, ignored.keys()))
    }

    /// Look up a cluster from a fresh detection run by its key.
    pub fn find_cluster(&self, key: &str) -> Result<Option<Cluster>> {
        Ok(self
            .detect_clusters()?
            .clusters
            .into_iter()
            .find(|c| c.key == key))
    }

    pub fn merge_cluster(&self, cluster: &Cluster) -> Result<usize> {
        self.merge_clusters(std::slice::from_ref(cluster))
    }

    /// Merge several clusters and write the alias map back once.
    pub fn merge_clusters(&self, clusters: &[Cluster]) -> Result<usize> {
        let (merged, _) = self.store.update(|state| {
            let merged = alias::merge_all(&mut state.aliases, clusters);
            (merged, merged > 0)
        })?;
        Ok(merged)
    }

    /// Detect and merge everything with default targets.
    pub fn merge_all(&self) -> Result<usize> {
        let detection = self.detect_clusters()?;
        if detection.skipped {
            warn!("Merge-all skipped: detection did not run");
            return Ok(0);
        }
        let merged = self.merge_clusters(&detection.clusters)?;
        info!(
            "Merged {} variant(s) across {} cluster(s)",
            merged,
            detection.clusters.len()
        );
        Ok(merged)
    }

    pub fn unmerge(&self, variant: &str) -> Result<Option<String>> {
        let (removed, _) = self.store.update(|state| {
            let removed = alias::unmerge(&mut state.aliases, variant);
            let changed = removed.is_some();
            (removed, changed)
        })?;
        Ok(removed)
    }

    /// Dismiss a cluster for this session.
    ///
    /// Rewrites the alias map unchanged so subscribers re-run detection.
    pub fn ignore_cluster(&self, cluster: &Cluster) -> Result<bool> {
        let added = self.ignored()?.ignore(cluster);
        if added {
            self.store.touch()?;
        }
        Ok(added)
    }

    pub fn resolve(&self, name: &str) -> Result<String> {
        let state = self.store.get()?;
        Ok(alias::resolve(&state.aliases, name).to_string())
    }

    // --- Graph ---

    /// Build the link chart from current archive and store contents.
    pub fn build_graph(&self, scope: &ReportScope, visibility: Visibility) -> Result<GraphModel> {
        let reports = scope.filter(self.archive.reports()?);
        let state = self.store.get()?;
        Ok(graph::build(&GraphInputs::new(&reports, &state, visibility)))
    }

    /// Fresh layout for `model`, not yet started.
    pub fn layout(&self, model: &GraphModel) -> ForceSimulation {
        ForceSimulation::new(model, self.config.layout.clone())
    }

    /// Resolve a node id from `graph` to the record behind it.
    pub fn inspect(&self, node_id: &str, graph: &GraphModel) -> Result<Option<NodeDetails>> {
        let Some(node) = graph.node(node_id) else {
            return Ok(None);
        };

        let details = match node.kind {
            NodeKind::Case => node.source_report.clone().map(|report| NodeDetails::Case {
                report,
                is_manual: node.is_manual,
            }),
            NodeKind::Entity => {
                let state = self.store.get()?;
                let mentions = self
                    .archive
                    .reports()?
                    .into_iter()
                    .filter(|r| graph.contains_node(&graph::case_node_id(&r.id)))
                    .flat_map(|r| {
                        let (report_id, topic) = (r.id, r.topic);
                        r.entities.into_iter().map(move |entity| Mention {
                            report_id: report_id.clone(),
                            topic: topic.clone(),
                            entity,
                        })
                    })
                    .filter(|m| {
                        let cleaned = canon::clean_display(&m.entity.name);
                        entity_node_id(alias::resolve(&state.aliases, &cleaned)).as_deref()
                            == Some(node_id)
                    })
                    .collect();
                Some(NodeDetails::Entity {
                    label: node.label.clone(),
                    subtype: node.subtype.unwrap_or_default(),
                    connection_count: node.connection_count,
                    is_manual: node.is_manual,
                    mentions,
                })
            }
        };
        Ok(details)
    }

    // --- Manual annotations ---

    pub fn add_manual_node(
        &self,
        kind: NodeKind,
        label: &str,
        subtype: Option<EntityType>,
    ) -> Result<ManualNode> {
        let label = label.trim();
        if label.is_empty() {
            return Err(LinkchartError::Validation("Node label cannot be empty".into()));
        }
        let subtype = match kind {
            NodeKind::Case => None,
            NodeKind::Entity => Some(subtype.unwrap_or_default()),
        };
        let node = ManualNode::new(kind, label, subtype);
        self.store.append_manual_node(node.clone())?;
        info!("Added manual {} node '{}' ({})", kind, node.label, node.id);
        Ok(node)
    }

    pub fn add_manual_connection(&self, source: &str, target: &str) -> Result<ManualConnection> {
        if source == target {
            return Err(LinkchartError::Validation(
                "Cannot connect a node to itself".into(),
            ));
        }
        let connection = ManualConnection::new(source, target);
        self.store.append_manual_connection(connection.clone())?;
        info!("Linked {} -> {}", source, target);
        Ok(connection)
    }

    /// Flip hidden membership. Returns the new state.
    pub fn toggle_hidden(&self, node_id: &str) -> Result<bool> {
        let (hidden, _) = self.store.update(|state| (toggle(&mut state.hidden, node_id), true))?;
        Ok(hidden)
    }

    /// Flip flagged membership. Returns the new state.
    pub fn toggle_flagged(&self, node_id: &str) -> Result<bool> {
        let (flagged, _) = self.store.update(|state| (toggle(&mut state.flagged, node_id), true))?;
        Ok(flagged)
    }

    /// Propagate an entity rename through the archive.
    pub fn rename_entity(&self, old: &str, new: &str) -> Result<usize> {
        let (old, new) = (old.trim(), new.trim());
        if new.is_empty() {
            return Err(LinkchartError::Validation("New entity name cannot be empty".into()));
        }
        if old == new {
            return Ok(0);
        }
        self.archive.rename_entity(old, new)
    }

    // --- Linking interaction ---

    pub fn linking_enabled(&self) -> Result<bool> {
        Ok(self.linking()?.is_enabled())
    }

    pub fn set_linking(&self, enabled: bool) -> Result<()> {
        self.linking()?.set_enabled(enabled);
        Ok(())
    }

    pub fn toggle_linking(&self) -> Result<bool> {
        Ok(self.linking()?.toggle())
    }

    /// Feed a node click through the linking state machine.
    ///
    /// Clicks on ids missing from `graph` are ignored. A completed link is
    /// written to the store and linking mode is switched off.
    pub fn handle_node_click(&self, node_id: &str, graph: &GraphModel) -> Result<Option<ClickOutcome>> {
        if !graph.contains_node(node_id) {
            return Ok(None);
        }

        let outcome = self.linking()?.click_node(node_id);
        if let ClickOutcome::LinkRequested { source, target } = &outcome {
            self.add_manual_connection(source, target)?;
            self.set_linking(false)?;
        }
        Ok(Some(outcome))
    }

    pub fn handle_canvas_click(&self) -> Result<bool> {
        Ok(self.linking()?.click_canvas())
    }

    pub fn selection(&self) -> Result<Option<String>> {
        Ok(self.linking()?.selection().map(str::to_string))
    }
}

/// Flip membership of `id`. Returns true if it is now a member.
fn toggle(set: &mut HashSet<String>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_string());
        true
    }
}
