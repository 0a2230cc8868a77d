use crate::config::LinkchartConfig;
use crate::engine;
use crate::http::{create_router, AppState};
use linkchart_core::{GraphStateStore, ReportArchive};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub async fn run(config: LinkchartConfig) -> anyhow::Result<()> {
    info!("Starting linkchart server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP: {}", config.http_addr());
    info!("Data: {:?}", config.server.data_dir);

    let errors = config.validate();
    if !errors.is_empty() {
        anyhow::bail!("Invalid configuration: {}", errors.join("; "));
    }

    let engine = Arc::new(engine::open(&config)?);
    info!(
        "Loaded {} report(s), state version {}",
        engine.archive().reports()?.len(),
        engine.store().version()
    );

    let detection = engine.detect_clusters()?;
    if detection.skipped {
        warn!(
            "Duplicate detection disabled for {} names (max_universe = {})",
            detection.universe_size, config.resolution.max_universe
        );
    } else {
        info!(
            "{} candidate duplicate cluster(s) across {} names",
            detection.clusters.len(),
            detection.universe_size
        );
    }

    // Log every state write; the receiver closes when the store is dropped.
    let changes = engine.subscribe();
    tokio::task::spawn_blocking(move || {
        while let Ok(change) = changes.recv() {
            debug!("Graph state changed (version {})", change.version);
        }
    });

    let app = create_router(AppState::new(engine.clone()));
    let addr = config.http_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{} (chart at /viz)", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received, terminating...");
            }
        })
        .await?;

    Ok(())
}
