use crate::graph::*;
use crate::types::*;
use proptest::prelude::*;
use std::collections::HashSet;

fn build_with(reports: &[Report], state: &GraphState, visibility: Visibility) -> GraphModel {
    build(&GraphInputs::new(reports, state, visibility))
}

fn show_all() -> Visibility {
    Visibility::new().with_singletons(true)
}

/// Two reports sharing Atlas and Jane Roe, a child report, and a
/// singleton mention of Shadow Corp:
///
/// r1 (Atlas Inquiry) -- Atlas Holdings Inc., Jane Roe, Shadow Corp
/// r2 (Roe Follow-up) -- Atlas Holdings Inc., Jane Roe; child of r1
fn build_test_reports() -> Vec<Report> {
    vec![
        Report::new("r1", "Atlas Inquiry")
            .with_case("c1")
            .with_entity(Entity::organization("Atlas Holdings Inc."))
            .with_entity(Entity::new("Jane Roe", EntityType::Unknown))
            .with_entity(Entity::organization("Shadow Corp")),
        Report::new("r2", "Roe Follow-up")
            .with_case("c1")
            .with_parent("Atlas Inquiry")
            .with_entity(Entity::new("**Atlas Holdings Inc.**", EntityType::Unknown))
            .with_entity(Entity::person("Jane Roe")),
    ]
}

fn assert_no_duplicate_edges(model: &GraphModel) {
    let mut seen = HashSet::new();
    for edge in &model.edges {
        let key = if edge.source <= edge.target {
            (edge.source.clone(), edge.target.clone())
        } else {
            (edge.target.clone(), edge.source.clone())
        };
        assert!(seen.insert(key), "duplicate edge {:?}", edge);
    }
}

#[test]
fn test_case_and_entity_nodes() {
    let reports = build_test_reports();
    let model = build_with(&reports, &GraphState::default(), show_all());

    let case = model.node("case-r1").unwrap();
    assert_eq!(case.kind, NodeKind::Case);
    assert_eq!(case.label, "Atlas Inquiry");
    assert_eq!(case.source_report.as_ref().unwrap().id, "r1");

    // markdown-wrapped mention collapses onto the same node
    let atlas = model.node("entity-atlasholdingsinc").unwrap();
    assert_eq!(atlas.kind, NodeKind::Entity);
    assert_eq!(atlas.label, "Atlas Holdings Inc.");
    assert_eq!(atlas.connection_count, 2);

    assert_eq!(model.stats.reports_in_scope, 2);
    assert_eq!(model.stats.entity_node_count, 3);
    assert_no_duplicate_edges(&model);
}

#[test]
fn test_parent_edge() {
    let reports = build_test_reports();
    let model = build_with(&reports, &GraphState::default(), show_all());

    let parent_edges: Vec<_> = model
        .edges
        .iter()
        .filter(|e| e.weight == PARENT_EDGE_WEIGHT)
        .collect();
    assert_eq!(parent_edges.len(), 1);
    assert_eq!(parent_edges[0].source, "case-r1");
    assert_eq!(parent_edges[0].target, "case-r2");
}

#[test]
fn test_parent_edge_requires_parent_in_scope() {
    let reports = vec![Report::new("r2", "Child").with_parent("Missing Parent")];
    let model = build_with(&reports, &GraphState::default(), show_all());
    assert!(model.edges.is_empty());
}

#[test]
fn test_subtype_promoted_never_demoted() {
    let reports = build_test_reports();
    let model = build_with(&reports, &GraphState::default(), show_all());

    // first seen as UNKNOWN, promoted by r2's PERSON mention
    let jane = model.node("entity-janeroe").unwrap();
    assert_eq!(jane.subtype, Some(EntityType::Person));

    // first seen as ORGANIZATION, r2's UNKNOWN mention does not demote
    let atlas = model.node("entity-atlasholdingsinc").unwrap();
    assert_eq!(atlas.subtype, Some(EntityType::Organization));
}

#[test]
fn test_aliases_collapse_nodes() {
    let reports = vec![
        Report::new("r1", "One").with_entity(Entity::organization("Atlas Holdings Inc.")),
        Report::new("r2", "Two").with_entity(Entity::organization("Atlas Holdings")),
    ];
    let mut state = GraphState::default();

    let before = build_with(&reports, &state, show_all());
    assert_eq!(before.stats.entity_node_count, 2);

    state
        .aliases
        .insert("Atlas Holdings".into(), "Atlas Holdings Inc.".into());
    let after = build_with(&reports, &state, show_all());
    assert_eq!(after.stats.entity_node_count, 1);
    assert_eq!(after.node("entity-atlasholdingsinc").unwrap().connection_count, 2);
}

#[test]
fn test_empty_entity_names_are_skipped() {
    let reports = vec![Report::new("r1", "One")
        .with_entity(Entity::organization("**"))
        .with_entity(Entity::organization("  "))
        .with_entity(Entity::organization("..."))];
    let model = build_with(&reports, &GraphState::default(), show_all());

    assert_eq!(model.nodes.len(), 1);
    assert!(model.edges.is_empty());
}

#[test]
fn test_repeated_mention_counts_once() {
    let reports = vec![Report::new("r1", "One")
        .with_entity(Entity::person("Jane Roe"))
        .with_entity(Entity::person("JANE ROE"))];
    let model = build_with(&reports, &GraphState::default(), show_all());

    assert_eq!(model.edges.len(), 1);
    assert_eq!(model.node("entity-janeroe").unwrap().connection_count, 1);
}

#[test]
fn test_hidden_nodes_are_gated() {
    let reports = build_test_reports();
    let mut state = GraphState::default();
    state.hidden.insert("entity-shadowcorp".into());

    for visibility in [
        Visibility::new(),
        show_all(),
        Visibility::new().with_flagged_only(true),
        show_all().with_flagged_only(true),
    ] {
        let model = build_with(&reports, &state, visibility);
        assert!(!model.contains_node("entity-shadowcorp"));
        assert_eq!(model.edges_of("entity-shadowcorp").count(), 0);
    }

    let restored = build_with(&reports, &state, show_all().with_hidden_nodes(true));
    assert!(restored.contains_node("entity-shadowcorp"));
    assert_eq!(restored.edges_of("entity-shadowcorp").count(), 1);
}

#[test]
fn test_hidden_case_drops_its_mentions() {
    let reports = build_test_reports();
    let mut state = GraphState::default();
    state.hidden.insert("case-r1".into());

    let model = build_with(&reports, &state, show_all());
    assert!(!model.contains_node("case-r1"));
    assert!(!model.contains_node("entity-shadowcorp"));
    assert_eq!(model.stats.reports_in_scope, 1);
}

#[test]
fn test_singletons_hidden_by_default() {
    let reports = build_test_reports();
    let state = GraphState::default();

    let model = build_with(&reports, &state, Visibility::new());
    assert!(!model.contains_node("entity-shadowcorp"));
    assert!(model.contains_node("entity-janeroe"));
    assert!(model.contains_node("case-r1"));

    let model = build_with(&reports, &state, show_all());
    assert!(model.contains_node("entity-shadowcorp"));
}

#[test]
fn test_flagged_only() {
    let reports = build_test_reports();
    let mut state = GraphState::default();
    state.flagged.insert("entity-shadowcorp".into());

    let model = build_with(&reports, &state, Visibility::new().with_flagged_only(true));
    let ids: HashSet<&str> = model.nodes.iter().map(|n| n.id.as_str()).collect();
    let expected: HashSet<&str> = ["case-r1", "case-r2", "entity-shadowcorp"].into_iter().collect();
    assert_eq!(ids, expected);

    // flagged-only overrides the singleton filter
    assert!(model.contains_node("entity-shadowcorp"));
    assert!(model.edges.iter().all(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str())));
}

#[test]
fn test_manual_nodes_and_connections() {
    let reports = build_test_reports();
    let mut state = GraphState::default();
    let tipster = ManualNode::new(NodeKind::Entity, "Anonymous Tipster", Some(EntityType::Person));
    let lead = ManualNode::new(NodeKind::Case, "Offshore Lead", None);
    state.manual_connections.push(ManualConnection::new(&tipster.id, "entity-shadowcorp"));
    state.manual_connections.push(ManualConnection::new(&lead.id, &tipster.id));
    // duplicates an organic edge; ignored
    state.manual_connections.push(ManualConnection::new("entity-janeroe", "case-r1"));
    // dangling endpoint; ignored
    state.manual_connections.push(ManualConnection::new(&tipster.id, "entity-nobody"));
    state.manual_nodes.push(tipster.clone());
    state.manual_nodes.push(lead.clone());

    let model = build_with(&reports, &state, Visibility::new());

    let manual_edges: Vec<_> = model.edges.iter().filter(|e| e.is_manual).collect();
    assert_eq!(manual_edges.len(), 2);
    assert!(manual_edges.iter().all(|e| e.weight == MANUAL_EDGE_WEIGHT));

    // manual edge lifts Shadow Corp above the singleton cut
    let shadow = model.node("entity-shadowcorp").unwrap();
    assert_eq!(shadow.connection_count, 2);

    let lead_node = model.node(&lead.id).unwrap();
    assert!(lead_node.is_manual);
    let placeholder = lead_node.source_report.as_ref().unwrap();
    assert_eq!(placeholder.topic, "Offshore Lead");
    assert!(placeholder.entities.is_empty());
    assert_eq!(placeholder.status, ReportStatus::Completed);

    assert_no_duplicate_edges(&model);
}

#[test]
fn test_manual_case_backed_by_report() {
    let reports = vec![Report::new("r9", "Real Report")];
    let mut state = GraphState::default();
    state
        .manual_nodes
        .push(ManualNode::new(NodeKind::Case, "Sketch", None).with_id("case-r9"));

    let model = build_with(&reports, &state, show_all());
    let node = model.node("case-r9").unwrap();
    assert!(node.is_manual);
    assert_eq!(node.label, "Sketch");
    assert_eq!(node.source_report.as_ref().unwrap().topic, "Real Report");
    assert_eq!(model.nodes.len(), 1);
}

#[test]
fn test_stats_consistency() {
    let reports = build_test_reports();
    let model = build_with(&reports, &GraphState::default(), Visibility::new());

    assert_eq!(
        model.stats.entity_node_count,
        model.nodes.iter().filter(|n| n.kind == NodeKind::Entity).count()
    );
    assert_eq!(
        model.stats.hub_count,
        model.nodes.iter().filter(|n| n.connection_count > 1).count()
    );
    assert_eq!(model.stats.edge_count, model.edges.len());
}

#[test]
fn test_hubs_sorted_by_connections() {
    let mut reports = build_test_reports();
    reports.push(Report::new("r3", "Third").with_entity(Entity::person("Jane Roe")));
    reports.push(Report::new("r4", "Fourth").with_entity(Entity::person("Jane Roe")));
    let model = build_with(&reports, &GraphState::default(), show_all());

    let hubs = model.hubs();
    assert_eq!(hubs[0].id, "entity-janeroe");
    assert_eq!(hubs[0].connection_count, 4);
    assert!(hubs.iter().all(|n| n.connection_count > 1));
}

#[test]
fn test_report_scope() {
    let mut reports = build_test_reports();
    reports.push(Report::new("r3", "Other Case").with_case("c2"));

    assert_eq!(ReportScope::All.filter(reports.clone()).len(), 3);
    let scoped = ReportScope::Case("c2".into()).filter(reports);
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].id, "r3");
    assert_eq!(ReportScope::from_case(Some(String::new())), ReportScope::All);
}

#[test]
fn test_build_is_deterministic() {
    let reports = build_test_reports();
    let state = GraphState::default();
    assert_eq!(
        build_with(&reports, &state, show_all()),
        build_with(&reports, &state, show_all())
    );
}

fn entity_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Jane Roe", "Atlas", "Orion Labs", "Shadow Corp", "Kestrel"])
        .prop_map(str::to_string)
}

proptest! {
    #[test]
    fn prop_edges_are_unique(
        mentions in prop::collection::vec(prop::collection::vec(entity_name(), 0..6), 1..5),
        links in prop::collection::vec((0usize..8, 0usize..8), 0..10),
        show_singletons in any::<bool>(),
    ) {
        let reports: Vec<Report> = mentions
            .iter()
            .enumerate()
            .map(|(i, names)| {
                names.iter().fold(Report::new(format!("r{}", i), format!("Topic {}", i)), |r, n| {
                    r.with_entity(Entity::person(n.clone()))
                })
            })
            .collect();

        let mut ids: Vec<String> = reports.iter().map(|r| case_node_id(&r.id)).collect();
        ids.extend(["Jane Roe", "Atlas", "Orion Labs"].iter().filter_map(|n| entity_node_id(n)));

        let mut state = GraphState::default();
        for (a, b) in links {
            let a = &ids[a % ids.len()];
            let b = &ids[b % ids.len()];
            state.manual_connections.push(ManualConnection::new(a.clone(), b.clone()));
        }

        let model = build_with(&reports, &state, Visibility::new().with_singletons(show_singletons));
        let mut seen = HashSet::new();
        for edge in &model.edges {
            prop_assert_ne!(&edge.source, &edge.target);
            let key = if edge.source <= edge.target {
                (edge.source.clone(), edge.target.clone())
            } else {
                (edge.target.clone(), edge.source.clone())
            };
            prop_assert!(seen.insert(key));
        }
        prop_assert_eq!(
            model.stats.hub_count,
            model.nodes.iter().filter(|n| n.connection_count > 1).count()
        );
    }
}
