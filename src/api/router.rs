use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::edge;
use super::health;
use super::middleware::metrics_middleware;
use super::proxy;
use super::state::AppState;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Prefix of the proxy's own endpoints; everything else is forwarded
pub const EDGE_PREFIX: &str = "/__edge";

/// Create a minimal router without state
/// Note: /ready and the proxy fallback need state
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .layer(TraceLayer::new_for_http())
}

/// Create the full router with application state
pub fn create_router_with_state(state: AppState, metrics: Option<(PrometheusMetrics, &str)>) -> Router {
    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Control, status and ranking
        .nest(EDGE_PREFIX, edge::create_edge_router().layer(CorsLayer::permissive()));

    if let Some((metrics, path)) = metrics {
        router = router.merge(create_metrics_router(metrics, path));
    }

    router
        // Everything else goes through the cache proxy
        .fallback(proxy::proxy_request)
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
