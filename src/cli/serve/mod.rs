//! Serve command - runs the cache proxy in front of the origin

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::create_router_with_state;
use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::observability::init_metrics;
use crate::infrastructure::proxy::{Registration, CLEANUP_SYNC_TAG};

/// Run the proxy server
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let metrics = init_metrics(&config.metrics);
    let state = crate::create_app_state_with_config(&config).await?;

    let sweeper = config
        .proxy
        .sweep_interval()
        .map(|interval| spawn_cleanup_sync(state.registration.clone(), interval));

    let app = create_router_with_state(
        state,
        metrics.map(|m| (m, config.metrics.path.as_str())),
    );

    let addr = build_socket_addr(&config)?;
    info!("Starting edge proxy on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    Ok(())
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

/// Fires the `cache-cleanup` sync at the active worker on a fixed period
fn spawn_cleanup_sync(registration: Arc<Registration>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match registration.sync(CLEANUP_SYNC_TAG, Utc::now()).await {
                Ok(report) => debug!(evicted = report.evicted, "Cleanup sync finished"),
                Err(e) => warn!(error = %e, "Cleanup sync failed"),
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!("Shutting down");
}
