use crate::cli::ConfigCommands;
use crate::config::LinkchartConfig;
use anyhow::Result;
use std::path::Path;

pub fn run(cmd: ConfigCommands, config_path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Validate => validate(config_path),
        ConfigCommands::Show => show(config_path),
    }
}

fn validate(config_path: &Path) -> Result<()> {
    let config = LinkchartConfig::load(config_path)?;
    let errors = config.validate();
    if errors.is_empty() {
        println!("✅ {} is valid.", config_path.display());
        return Ok(());
    }

    println!("❌ Validation errors in {}:", config_path.display());
    for e in &errors {
        println!("  - {}", e);
    }
    anyhow::bail!("{} validation error(s)", errors.len())
}

fn show(config_path: &Path) -> Result<()> {
    let config = LinkchartConfig::load_or_default(config_path);
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
