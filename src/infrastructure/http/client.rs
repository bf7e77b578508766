use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, CONNECTION, HOST, TRANSFER_ENCODING};

use crate::domain::proxy::{Fetcher, ProxyRequest, ProxyResponse};
use crate::domain::DomainError;

const HOP_BY_HOP: &[&str] = &[
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "upgrade",
];

/// Removes headers that only apply to a single connection
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    headers.remove(CONNECTION);
    headers.remove(TRANSFER_ENCODING);

    for name in HOP_BY_HOP {
        headers.remove(HeaderName::from_static(name));
    }
}

/// Real network fetcher using reqwest
///
/// No request timeout is applied; a hung origin hangs the request.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_connect_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, DomainError> {
        let mut headers = request.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(HOST);

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(headers);

        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DomainError::network(request.url.as_str(), format!("Request failed: {}", e)))?;

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);

        let body = response.bytes().await.map_err(|e| {
            DomainError::network(request.url.as_str(), format!("Failed to read body: {}", e))
        })?;

        tracing::trace!(url = %request.url, status = status.as_u16(), "Fetched from network");

        Ok(ProxyResponse::new(status, headers, body))
    }
}
