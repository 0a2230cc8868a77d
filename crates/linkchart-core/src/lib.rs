pub mod types;
pub mod error;
pub mod config;
pub mod canon;
pub mod matcher;
pub mod cluster;
pub mod alias;
pub mod graph;
pub mod layout;
pub mod storage;
pub mod archive;
pub mod api;

pub use error::{LinkchartError, Result};
pub use types::*;
pub use config::{LayoutConfig, ResolutionConfig};
pub use canon::{clean_display, core_name, normalize_id, tokens};
pub use matcher::{CanonicalName, MatchStrategy, NameMatcher};
pub use cluster::{cluster_key, Cluster, ClusterDetector, Detection, CLUSTER_KEY_SEPARATOR};
pub use alias::{merge_all, merge_cluster, merge_variants, resolve, unmerge, IgnoreList};
pub use graph::{
    build, case_node_id, entity_node_id, GraphEdge, GraphInputs, GraphModel, GraphNode,
    GraphStats, ReportScope, Visibility,
};
pub use layout::{
    node_radius, ClickOutcome, ForceSimulation, LayoutNode, LayoutSimulation, LinkState,
    LinkingSession, Point, SimulationDriver, TickCallback,
};
pub use storage::{GraphStateStore, MemoryStateStore, RedbStateStore, CURRENT_SCHEMA_VERSION};
pub use archive::{rename_in_reports, MemoryArchive, ReportArchive};
pub use api::{EngineConfig, Linkchart, Mention, NodeDetails};
