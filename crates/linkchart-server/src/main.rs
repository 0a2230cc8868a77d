use clap::Parser;
use linkchart_server::cli::{self, Cli, Commands};
use linkchart_server::{engine, serve, LinkchartConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        config: config_path,
        data_dir,
        command,
    } = Cli::parse();
    let load = || LinkchartConfig::load_or_default(&config_path).with_data_dir(data_dir.clone());

    match command {
        Commands::Serve => serve::run(load()).await,
        Commands::Config(cmd) => cli::config_cmd::run(cmd, &config_path),
        Commands::Clusters => cli::resolve::clusters(&engine::open(&load())?),
        Commands::MergeAll => cli::resolve::merge_all(&engine::open(&load())?),
        Commands::Unmerge(args) => cli::resolve::unmerge(&engine::open(&load())?, args),
        Commands::Aliases => cli::resolve::aliases(&engine::open(&load())?),
        Commands::Graph(args) => cli::graph::run(&engine::open(&load())?, args),
        Commands::Stats(args) => cli::stats::run(&engine::open(&load())?, args),
    }
}
