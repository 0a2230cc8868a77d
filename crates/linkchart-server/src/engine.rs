use crate::archive::JsonFileArchive;
use crate::config::LinkchartConfig;
use linkchart_core::{Linkchart, RedbStateStore};
use std::sync::Arc;
use tracing::info;

/// Engine over the on-disk state store and JSON report archive.
pub type Engine = Linkchart<RedbStateStore, JsonFileArchive>;

/// Open the state store and archive under the configured data directory.
pub fn open(config: &LinkchartConfig) -> anyhow::Result<Engine> {
    std::fs::create_dir_all(&config.server.data_dir)?;

    info!("Opening state store at {}", config.db_path().display());
    let store = Arc::new(RedbStateStore::open(config.db_path())?);
    let archive = Arc::new(JsonFileArchive::open(config.reports_path())?);

    Ok(Linkchart::new(store, archive, config.engine_config())?)
}
