//! Intercepted request model

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Method, Url};

use crate::domain::DomainError;

/// A request intercepted by the proxy
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyRequest {
    /// Create a request with an empty body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Create a GET request
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Parse a URL and create a GET request for it
    pub fn get_str(url: &str) -> Result<Self, DomainError> {
        let url = Url::parse(url)
            .map_err(|e| DomainError::validation(format!("Invalid URL '{}': {}", url, e)))?;
        Ok(Self::get(url))
    }

    /// Add a header, ignoring values that are not valid header text
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(HeaderName::from_static(name), value);
        }
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Whether the `Accept` header asks for an HTML document
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.contains("text/html"))
    }

    /// Key under which the response is stored in a partition
    pub fn cache_key(&self) -> String {
        self.url.as_str().to_string()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_html() {
        let request = ProxyRequest::get_str("https://studio.example/")
            .unwrap()
            .with_header("accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8");

        assert!(request.accepts_html());
    }

    #[test]
    fn test_does_not_accept_html_without_header() {
        let request = ProxyRequest::get_str("https://studio.example/api/posts").unwrap();
        assert!(!request.accepts_html());
    }

    #[test]
    fn test_cache_key_includes_query() {
        let request = ProxyRequest::get_str("https://studio.example/blog?page=2").unwrap();
        assert_eq!(request.cache_key(), "https://studio.example/blog?page=2");
    }

    #[test]
    fn test_invalid_url_is_validation_error() {
        let result = ProxyRequest::get_str("not a url");
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }
}
