use crate::cli::GraphArgs;
use crate::engine::Engine;
use anyhow::Result;

pub fn run(engine: &Engine, args: GraphArgs) -> Result<()> {
    let graph = engine.build_graph(&args.scope(), args.visibility())?;
    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}
