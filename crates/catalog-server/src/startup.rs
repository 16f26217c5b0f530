//! Server startup utilities: logging, banner and shutdown signal.

use catalog_config::{AppConfig, ObservabilityConfig};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
#[must_use]
pub fn default_filter(config: &ObservabilityConfig) -> String {
    format!("{},catalog=debug,tower_http=debug,sqlx=warn", config.log_level)
}

/// Installs the global subscriber; `log_format = "json"` emits one JSON
/// object per line, anything else the human-readable format.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(config)));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
    }
}

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
    ____                 __           __     ______      __        __
   / __ \_________  ____/ /_  _______/ /_   / ____/___ _/ /_____ _/ /___  ____ _
  / /_/ / ___/ __ \/ __  / / / / ___/ __/  / /   / __ `/ __/ __ `/ / __ \/ __ `/
 / ____/ /  / /_/ / /_/ / /_/ / /__/ /_   / /___/ /_/ / /_/ /_/ / / /_/ / /_/ /
/_/   /_/   \____/\__,_/\__,_/\___/\__/   \____/\__,_/\__/\__,_/_/\____/\__, /
                                                                       /____/
    "#);
}

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let addr = config.server.addr();
    info!("{}", separator);
    info!("Environment: {}", config.app.environment);
    info!("REST API:    http://{}{}", addr, config.server.api_prefix);
    info!("Health:      http://{}/health", addr);
    info!("API Docs:    http://{}/swagger-ui", addr);
    info!("Cache:       {}", if config.redis.enabled { "redis" } else { "disabled" });
    info!("{}", separator);
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
