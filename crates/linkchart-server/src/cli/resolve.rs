use crate::cli::{truncate, UnmergeArgs};
use crate::engine::Engine;
use anyhow::Result;
use linkchart_core::GraphStateStore;

pub fn clusters(engine: &Engine) -> Result<()> {
    let detection = engine.detect_clusters()?;
    if detection.skipped {
        println!(
            "⚠️  {} unique names exceeds max_universe; detection skipped.",
            detection.universe_size
        );
        return Ok(());
    }
    if detection.clusters.is_empty() {
        println!("No duplicate clusters among {} names.", detection.universe_size);
        return Ok(());
    }

    println!();
    println!("{:<40} {:>7}  MEMBERS", "TARGET", "SIZE");
    println!("{}", "─".repeat(90));
    for cluster in &detection.clusters {
        let others: Vec<&str> = cluster.variants().collect();
        println!(
            "{:<40} {:>7}  {}",
            truncate(&cluster.target, 40),
            cluster.members.len(),
            others.join(", ")
        );
    }
    println!();
    println!(
        "{} cluster(s) across {} names",
        detection.clusters.len(),
        detection.universe_size
    );
    Ok(())
}

pub fn merge_all(engine: &Engine) -> Result<()> {
    let merged = engine.merge_all()?;
    println!("✅ Merged {} variant(s).", merged);
    Ok(())
}

pub fn unmerge(engine: &Engine, args: UnmergeArgs) -> Result<()> {
    match engine.unmerge(&args.variant)? {
        Some(target) => println!("✅ '{}' no longer resolves to '{}'.", args.variant, target),
        None => println!("No alias for '{}'.", args.variant),
    }
    Ok(())
}

pub fn aliases(engine: &Engine) -> Result<()> {
    let mut entries: Vec<(String, String)> =
        engine.store().get()?.aliases.into_iter().collect();
    if entries.is_empty() {
        println!("Alias map is empty.");
        return Ok(());
    }
    entries.sort();

    println!();
    println!("{:<40}    CANONICAL", "VARIANT");
    println!("{}", "─".repeat(80));
    for (variant, canonical) in &entries {
        println!("{:<40} -> {}", truncate(variant, 40), canonical);
    }
    println!();
    Ok(())
}
