use linkchart_core::{
    EngineConfig, Entity, EntityType, LayoutNode, LayoutSimulation, Linkchart, MemoryArchive,
    MemoryStateStore, NodeKind, Report, ReportScope, SimulationDriver, Visibility,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Linkchart Basic Usage Example ===\n");

    // 1. Load a few reports into an in-memory archive
    let archive = Arc::new(MemoryArchive::new(vec![
        Report::new("r1", "Atlas Inquiry")
            .with_case("c1")
            .with_entity(Entity::organization("Atlas Holdings Inc."))
            .with_entity(Entity::person("Jane Roe"))
            .with_entity(Entity::organization("Shadow Corp")),
        Report::new("r2", "Roe Follow-up")
            .with_case("c1")
            .with_parent("Atlas Inquiry")
            .with_entity(Entity::new("**Atlas Holdings**", EntityType::Unknown))
            .with_entity(Entity::person("Jane Roe")),
    ]));
    let engine = Linkchart::new(Arc::new(MemoryStateStore::new()), archive, EngineConfig::default())?;

    // 2. Detect duplicate names
    let detection = engine.detect_clusters()?;
    println!("1. Found {} cluster(s) in {} unique names", detection.clusters.len(), detection.universe_size);
    for cluster in &detection.clusters {
        println!("   {:?} -> '{}'", cluster.members, cluster.target);
    }

    // 3. Merge them all
    let merged = engine.merge_all()?;
    println!("\n2. Merged {} variant(s)", merged);

    // 4. Annotate
    let tipster = engine.add_manual_node(NodeKind::Entity, "Anonymous tipster", Some(EntityType::Person))?;
    engine.add_manual_connection(&tipster.id, "entity-janeroe")?;

    // 5. Build and lay out the chart
    let graph = engine.build_graph(&ReportScope::All, Visibility::new())?;
    println!(
        "\n3. Graph: {} nodes, {} edges, {} hubs",
        graph.nodes.len(),
        graph.stats.edge_count,
        graph.stats.hub_count
    );
    for hub in graph.hubs() {
        println!("   {} ({} connections)", hub.label, hub.connection_count);
    }

    let frames = Arc::new(AtomicUsize::new(0));
    let counter = frames.clone();
    let mut layout = engine.layout(&graph);
    layout.on_tick(Box::new(move |_nodes: &[LayoutNode]| {
        counter.fetch_add(1, Ordering::Relaxed);
    }));

    let mut driver = SimulationDriver::new();
    driver.rebuild(layout);
    while driver.tick() {}

    println!("\n4. Layout settled after {} ticks", frames.load(Ordering::Relaxed));
    if let Some(layout) = driver.active() {
        for node in layout.nodes() {
            println!("   {:<40} ({:>7.1}, {:>7.1})", node.id, node.position.x, node.position.y);
        }
    }

    Ok(())
}
