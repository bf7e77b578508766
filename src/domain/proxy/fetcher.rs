//! Network access seam

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::request::ProxyRequest;
use super::response::ProxyResponse;
use crate::domain::DomainError;

/// Performs a single network attempt for a request
///
/// Transport failures are returned as `Err`; any HTTP status, including
/// 4xx and 5xx, is a successful fetch.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};

    use tokio::sync::Notify;

    /// Scripted fetcher that counts invocations
    #[derive(Debug, Default)]
    pub struct StubFetcher {
        responses: RwLock<HashMap<String, ProxyResponse>>,
        failures: RwLock<HashSet<String>>,
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: &str, response: ProxyResponse) -> Self {
            self.set_response(url, response);
            self
        }

        pub fn with_failure(self, url: &str) -> Self {
            self.failures.write().unwrap().insert(url.to_string());
            self
        }

        /// Hold every fetch until the gate is notified
        pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        pub fn set_response(&self, url: &str, response: ProxyResponse) {
            self.failures.write().unwrap().remove(url);
            self.responses
                .write()
                .unwrap()
                .insert(url.to_string(), response);
        }

        pub fn set_failure(&self, url: &str) {
            self.failures.write().unwrap().insert(url.to_string());
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            let url = request.cache_key();

            if self.failures.read().unwrap().contains(&url) {
                return Err(DomainError::network(url, "connection refused"));
            }

            let response = self.responses.read().unwrap().get(&url).cloned();

            Ok(response.unwrap_or_else(|| {
                ProxyResponse::new(
                    reqwest::StatusCode::NOT_FOUND,
                    reqwest::header::HeaderMap::new(),
                    "Not Found",
                )
            }))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_stub_returns_scripted_response() {
            let fetcher = StubFetcher::new()
                .with_response("https://studio.example/a.css", ProxyResponse::ok("body{}"));
            let request = ProxyRequest::get_str("https://studio.example/a.css").unwrap();

            let response = fetcher.fetch(&request).await.unwrap();

            assert_eq!(response.body.as_ref(), b"body{}");
            assert_eq!(fetcher.calls(), 1);
        }

        #[tokio::test]
        async fn test_stub_failure_and_unknown_url() {
            let fetcher = StubFetcher::new().with_failure("https://studio.example/down");

            let down = ProxyRequest::get_str("https://studio.example/down").unwrap();
            assert!(fetcher.fetch(&down).await.unwrap_err().is_network());

            let unknown = ProxyRequest::get_str("https://studio.example/unknown").unwrap();
            let response = fetcher.fetch(&unknown).await.unwrap();
            assert_eq!(response.status, reqwest::StatusCode::NOT_FOUND);
            assert_eq!(fetcher.calls(), 2);
        }
    }
}
