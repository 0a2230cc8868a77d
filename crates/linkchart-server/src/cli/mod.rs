pub mod config_cmd;
pub mod graph;
pub mod resolve;
pub mod stats;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "linkchart")]
#[command(version, about = "Duplicate-entity resolution and link charts over investigation reports")]
pub struct Cli {
    /// Path to linkchart.toml
    #[arg(
        long,
        global = true,
        env = "LINKCHART_CONFIG",
        default_value = "linkchart.toml"
    )]
    pub config: PathBuf,

    /// Path to data directory (overrides config file)
    #[arg(long, global = true, env = "LINKCHART_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve,
    /// List candidate duplicate clusters
    Clusters,
    /// Merge every detected cluster into its default target
    MergeAll,
    /// Remove the alias for one variant
    Unmerge(UnmergeArgs),
    /// Print the alias map
    Aliases,
    /// Build the link chart and print it as JSON
    Graph(GraphArgs),
    /// Graph statistics
    Stats(GraphArgs),
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Validate,
    Show,
}

#[derive(Args, Debug)]
pub struct UnmergeArgs {
    /// Variant name whose alias is removed
    pub variant: String,
}

#[derive(Args, Debug, Default, Clone)]
pub struct GraphArgs {
    /// Limit to reports filed under this case
    #[arg(long)]
    pub case: Option<String>,

    /// Keep entities mentioned by a single report
    #[arg(long)]
    pub singletons: bool,

    /// Include hidden nodes
    #[arg(long)]
    pub hidden: bool,

    /// Only flagged nodes (plus case nodes)
    #[arg(long)]
    pub flagged_only: bool,
}

impl GraphArgs {
    pub fn scope(&self) -> linkchart_core::ReportScope {
        linkchart_core::ReportScope::from_case(self.case.clone())
    }

    pub fn visibility(&self) -> linkchart_core::Visibility {
        linkchart_core::Visibility::new()
            .with_singletons(self.singletons)
            .with_hidden_nodes(self.hidden)
            .with_flagged_only(self.flagged_only)
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
