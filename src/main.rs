use std::sync::Arc;

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use carefinder::api::AppState;
use carefinder::{Cache, CareFinderConfig, DaycareCatalog, OpenDataClient, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = CareFinderConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    let cache = Arc::new(Cache::open(&config.cache.location)?);

    // Start with an empty catalog if no snapshot exists yet; searches report
    // data unavailable until /api/reload fetches one.
    let catalog = match DaycareCatalog::load_from_dir(&config.data.dir) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!("Could not load daycare snapshot: {}", e);
            DaycareCatalog::new()
        }
    };

    let state = Arc::new(AppState {
        config,
        cache,
        catalog,
        opendata: OpenDataClient::new(),
    });

    web::run(state).await
}
