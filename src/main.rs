//! Metrics Proxy - a caching front for a Prometheus-compatible backend

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metrics_proxy::{
    create_router, AppState, CacheStore, Config, MetricsService, PrometheusClient, ResponseCache,
};

/// Main entry point for the metrics proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the response cache and start its cleanup task
/// 4. Create the upstream client and the caching service
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metrics_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting metrics proxy");

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        upstream = %config.prometheus_url,
        max_items = config.cache_max_items,
        policy = %config.cache_eviction_policy,
        default_ttl_s = config.cache_default_ttl,
        cleanup_interval_s = config.cache_cleanup_interval,
        port = config.server_port,
        "Configuration loaded"
    );

    let cache: Arc<ResponseCache> = Arc::new(CacheStore::new(config.cache_config()));
    if cache.start_cleanup() {
        info!("Background cleanup task started");
    }

    let client = PrometheusClient::new(&config.prometheus_url, config.upstream_timeout())
        .context("failed to build upstream client")?;
    let service = MetricsService::new(cache.clone(), Arc::new(client)).with_summary_window(
        Duration::from_secs(config.summary_window),
        Duration::from_secs(config.summary_step),
    );

    let app = create_router(AppState::new(service));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cache.stop();
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
