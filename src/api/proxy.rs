//! Fallback handler forwarding every other path through the cache proxy

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use reqwest::Url;

use super::state::AppState;
use super::types::ApiError;
use crate::domain::proxy::{ProxyRequest, ProxyResponse};
use crate::infrastructure::http::strip_hop_by_hop;

/// Largest request body forwarded to the origin
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub async fn proxy_request(State(state): State<AppState>, request: Request) -> Response {
    let proxy_request = match to_proxy_request(&state.origin, request).await {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    let response = state.registration.handle_fetch(proxy_request).await;

    into_response(response)
}

/// Rebuilds an incoming request against the origin, keeping only its path
/// and query so a request can never be steered to another host
pub async fn to_proxy_request(origin: &Url, request: Request) -> Result<ProxyRequest, ApiError> {
    let (parts, body) = request.into_parts();

    let mut url = origin.clone();
    url.set_path(parts.uri.path());
    url.set_query(parts.uri.query());

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::payload_too_large(format!("Request body rejected: {}", e)))?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);

    Ok(ProxyRequest::new(parts.method, url)
        .with_headers(headers)
        .with_body(body))
}

pub fn into_response(response: ProxyResponse) -> Response {
    let mut headers = response.headers;
    strip_hop_by_hop(&mut headers);

    (response.status, headers, Body::from(response.body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn origin() -> Url {
        Url::parse("https://studio.example").unwrap()
    }

    #[tokio::test]
    async fn test_to_proxy_request_keeps_path_and_query() {
        let request = axum::http::Request::builder()
            .method("GET")
            .uri("/corsi?livello=base")
            .header("accept", "text/html")
            .header("connection", "keep-alive")
            .body(Body::empty())
            .unwrap();

        let proxied = to_proxy_request(&origin(), request).await.unwrap();

        assert_eq!(proxied.url.as_str(), "https://studio.example/corsi?livello=base");
        assert!(proxied.accepts_html());
        assert!(proxied.headers.get("connection").is_none());
    }

    #[tokio::test]
    async fn test_protocol_relative_path_stays_on_origin() {
        let request = axum::http::Request::builder()
            .uri("//evil.example/steal")
            .body(Body::empty())
            .unwrap();

        let proxied = to_proxy_request(&origin(), request).await.unwrap();

        assert_eq!(proxied.host(), Some("studio.example"));
    }

    #[tokio::test]
    async fn test_offline_response_conversion() {
        let response = into_response(ProxyResponse::offline());

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"Offline");
    }
}
