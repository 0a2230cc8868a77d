use crate::cli::{truncate, GraphArgs};
use crate::engine::Engine;
use anyhow::Result;
use linkchart_core::{GraphStateStore, NodeKind};

pub fn run(engine: &Engine, args: GraphArgs) -> Result<()> {
    let graph = engine.build_graph(&args.scope(), args.visibility())?;
    let state = engine.store().get()?;

    println!();
    println!("Link Chart Overview");
    println!("{}", "─".repeat(50));
    println!("Reports in scope: {:>8}", graph.stats.reports_in_scope);
    println!("Entities:         {:>8}", graph.stats.entity_node_count);
    println!("Links:            {:>8}", graph.stats.edge_count);
    println!("Hubs:             {:>8}", graph.stats.hub_count);
    println!("{}", "─".repeat(50));
    println!("Aliases:          {:>8}", state.aliases.len());
    println!("Manual nodes:     {:>8}", state.manual_nodes.len());
    println!("Manual links:     {:>8}", state.manual_connections.len());
    println!("Hidden:           {:>8}", state.hidden.len());
    println!("Flagged:          {:>8}", state.flagged.len());
    println!("{}", "─".repeat(50));

    let top: Vec<_> = graph
        .hubs()
        .into_iter()
        .filter(|n| n.kind == NodeKind::Entity)
        .take(10)
        .collect();
    if !top.is_empty() {
        println!("Most connected entities:");
        for node in top {
            println!("  {:<36} {:>6}", truncate(&node.label, 36), node.connection_count);
        }
    }
    println!();

    Ok(())
}
