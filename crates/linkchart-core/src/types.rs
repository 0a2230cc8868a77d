use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Variant name -> canonical name. Never chased across more than one hop.
pub type AliasMap = HashMap<String, String>;

/// Identifier of a node in the link chart (`case-…`, `entity-…`, `manual-…`).
pub type NodeId = String;

/// What an entity mention refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Person,
    Organization,
    #[default]
    Unknown,
}

impl EntityType {
    pub fn is_known(self) -> bool {
        self != EntityType::Unknown
    }
}

/// How a report portrays an entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// An entity mention extracted into a report.
///
/// Legacy archives store bare strings instead of objects; those
/// deserialize as [`EntityType::Unknown`] mentions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "EntityRecord")]
pub struct Entity {
    pub name: String,

    #[serde(rename = "type")]
    pub entity_type: EntityType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntityRecord {
    Legacy(String),
    Full {
        name: String,
        #[serde(rename = "type", default)]
        entity_type: EntityType,
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        sentiment: Option<Sentiment>,
    },
}

impl From<EntityRecord> for Entity {
    fn from(record: EntityRecord) -> Self {
        match record {
            EntityRecord::Legacy(name) => Entity::new(name, EntityType::Unknown),
            EntityRecord::Full {
                name,
                entity_type,
                role,
                sentiment,
            } => Entity {
                name,
                entity_type,
                role,
                sentiment,
            },
        }
    }
}

impl Entity {
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
            role: None,
            sentiment: None,
        }
    }

    pub fn person(name: impl Into<String>) -> Self {
        Self::new(name, EntityType::Person)
    }

    pub fn organization(name: impl Into<String>) -> Self {
        Self::new(name, EntityType::Organization)
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}

/// Lifecycle of a report in the archive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Running,
    #[default]
    Completed,
    Failed,
}

/// A source cited by a report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    pub title: String,
    pub uri: String,
}

/// An investigation report, handed in read-only by the archive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: String,

    /// Case this report was filed under, if any.
    #[serde(default)]
    pub case_id: Option<String>,

    pub topic: String,

    /// Topic of the report this one was spun off from.
    #[serde(default)]
    pub parent_topic: Option<String>,

    #[serde(default)]
    pub entities: Vec<Entity>,

    #[serde(default)]
    pub leads: Vec<String>,

    #[serde(default)]
    pub sources: Vec<SourceRef>,

    #[serde(default)]
    pub status: ReportStatus,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn new(id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            case_id: None,
            topic: topic.into(),
            parent_topic: None,
            entities: Vec::new(),
            leads: Vec::new(),
            sources: Vec::new(),
            status: ReportStatus::Completed,
            created_at: None,
        }
    }

    /// Stand-in record for a manually drawn case node with no report behind it.
    pub fn placeholder(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label)
    }

    pub fn with_case(mut self, case_id: impl Into<String>) -> Self {
        self.case_id = Some(case_id.into());
        self
    }

    pub fn with_parent(mut self, parent_topic: impl Into<String>) -> Self {
        self.parent_topic = Some(parent_topic.into());
        self
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }
}

/// Kind of a link-chart node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Case,
    Entity,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Case => write!(f, "CASE"),
            NodeKind::Entity => write!(f, "ENTITY"),
        }
    }
}

/// A node drawn by the analyst rather than derived from reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub subtype: Option<EntityType>,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl ManualNode {
    pub fn new(kind: NodeKind, label: impl Into<String>, subtype: Option<EntityType>) -> Self {
        Self {
            id: format!("manual-{}", Uuid::now_v7()),
            kind,
            subtype,
            label: label.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }
}

/// A link drawn by the analyst between two existing nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualConnection {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub created_at: DateTime<Utc>,
}

impl ManualConnection {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            source: source.into(),
            target: target.into(),
            created_at: Utc::now(),
        }
    }
}

/// Everything the engine is allowed to mutate: aliases, manual
/// annotations, and the hidden/flagged node sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphState {
    pub aliases: AliasMap,
    pub manual_nodes: Vec<ManualNode>,
    pub manual_connections: Vec<ManualConnection>,
    pub hidden: HashSet<NodeId>,
    pub flagged: HashSet<NodeId>,
}

/// Notification sent to store subscribers after every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// Monotonic write counter for the store instance.
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_entity_deserializes_as_unknown() {
        let report: Report = serde_json::from_str(
            r#"{"id": "r1", "topic": "Atlas", "entities": ["Atlas Holdings", {"name": "Jane Roe", "type": "PERSON", "role": "director"}]}"#,
        )
        .unwrap();

        assert_eq!(report.entities.len(), 2);
        assert_eq!(report.entities[0].name, "Atlas Holdings");
        assert_eq!(report.entities[0].entity_type, EntityType::Unknown);
        assert_eq!(report.entities[1].entity_type, EntityType::Person);
        assert_eq!(report.entities[1].role.as_deref(), Some("director"));
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let report: Report = serde_json::from_str(r#"{"id": "r2", "topic": "Bare"}"#).unwrap();

        assert!(report.entities.is_empty());
        assert!(report.leads.is_empty());
        assert!(report.sources.is_empty());
        assert_eq!(report.status, ReportStatus::Completed);
    }

    #[test]
    fn test_entity_type_defaults_to_unknown() {
        let entity: Entity = serde_json::from_str(r#"{"name": "Shadow Corp"}"#).unwrap();
        assert_eq!(entity.entity_type, EntityType::Unknown);
        assert!(!entity.entity_type.is_known());
    }

    #[test]
    fn test_manual_node_ids_are_unique() {
        let a = ManualNode::new(NodeKind::Entity, "Tipster", Some(EntityType::Person));
        let b = ManualNode::new(NodeKind::Entity, "Tipster", Some(EntityType::Person));
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("manual-"));
    }
}
