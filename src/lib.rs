//! Studio Edge
//!
//! An edge cache proxy for a small content site:
//! - Per-route caching strategies (cache-first, network-first,
//!   stale-while-revalidate) over versioned cache partitions
//! - Worker lifecycle with atomic install, stale-partition purge and
//!   time-based eviction of dynamic entries
//! - TF-IDF related-content ranking

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::{error, info};

use api::state::AppState;
use domain::relevance::RelevanceScorer;
use infrastructure::cache::{InMemoryCacheConfig, InMemoryCacheStorage};
use infrastructure::http::HttpFetcher;
use infrastructure::proxy::{CacheProxy, Registration};

/// Create the application state and register the configured worker version
///
/// A failed install is logged and leaves the proxy uncontrolled: requests
/// are forwarded to the origin until a later registration succeeds.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let proxy_config = config.proxy.to_proxy_config()?;
    let scoring = config.relevance.to_scoring_config()?;

    let storage = Arc::new(InMemoryCacheStorage::with_config(
        InMemoryCacheConfig::default().with_max_capacity(config.proxy.max_entries_per_partition),
    ));

    let fetcher = Arc::new(match config.proxy.connect_timeout() {
        Some(timeout) => HttpFetcher::with_connect_timeout(timeout)?,
        None => HttpFetcher::new(),
    });

    info!(
        origin = %proxy_config.origin,
        version = %proxy_config.version,
        manifest = proxy_config.manifest.len(),
        "Starting cache proxy"
    );

    let origin = proxy_config.origin.clone();
    let registration = Arc::new(Registration::new(fetcher.clone()));
    let worker = Arc::new(CacheProxy::new(proxy_config, storage.clone(), fetcher));

    if let Err(e) = registration.register(worker).await {
        error!(error = %e, "Worker registration failed, forwarding requests uncached");
    }

    Ok(AppState::new(
        registration,
        storage,
        Arc::new(RelevanceScorer::new(scoring)),
        origin,
    ))
}
