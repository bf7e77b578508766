//! Request metrics middleware

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::infrastructure::observability::record_http_request;

/// Label for requests answered by the proxy fallback
const PROXIED_PATH: &str = "proxied";

/// Records count, latency and server errors per route
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = route_label(&request);

    let response = next.run(request).await;

    record_http_request(
        method.as_str(),
        &path,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}

/// Matched route pattern; proxied paths share one label so arbitrary site
/// URLs do not become label values
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| PROXIED_PATH.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_request_uses_proxied_label() {
        let request = Request::builder()
            .uri("/corsi/yoga/123")
            .body(Body::empty())
            .unwrap();

        assert_eq!(route_label(&request), "proxied");
    }
}
