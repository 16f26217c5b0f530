//! # Product Catalog Server
//!
//! Loads configuration, connects PostgreSQL and Redis, and serves the
//! REST API until Ctrl+C or SIGTERM.

use catalog_config::ConfigLoader;
use catalog_core::{CatalogError, CatalogResult};
use catalog_server::startup::{init_logging, print_banner, print_startup_info, shutdown_signal};
use catalog_server::AppBuilder;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config_loader = match ConfigLoader::from_default_location() {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    let config = config_loader.get().await;

    init_logging(&config.observability);
    print_banner();
    info!("Starting {} v{}", config.app.name, env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: catalog_config::AppConfig) -> CatalogResult<()> {
    if config.observability.metrics_enabled {
        catalog_service::register_metrics();
    }

    let app = AppBuilder::new(config.clone()).build().await?;

    if config.cache.warm_on_startup {
        let cache_admin = app.cache_admin.clone();
        tokio::spawn(async move {
            let warm = cache_admin.warm().await;
            if warm.failed.is_empty() {
                info!("Cache warmed in {}ms: {:?}", warm.duration_ms, warm.warmed);
            } else {
                warn!("Cache warm-up incomplete, failed: {:?}", warm.failed);
            }
        });
    }

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CatalogError::Internal(format!("Failed to bind {addr}: {e}")))?;

    print_startup_info(&config);

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CatalogError::Internal(format!("REST server error: {e}")))?;

    app.db_pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}
