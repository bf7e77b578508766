//! Response model shared by the network, the partitions and the caller

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, DATE};
use reqwest::StatusCode;

/// An HTTP response as served or stored by the proxy
///
/// The body is reference counted, so cloning a response to store it in a
/// partition while returning it to the caller does not copy the payload.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// 200 response with no headers
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, HeaderMap::new(), body)
    }

    /// Synthetic response returned when neither network nor cache can answer
    pub fn offline() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        Self::new(StatusCode::SERVICE_UNAVAILABLE, headers, "Offline")
    }

    /// Set the `date` header to the given instant in IMF-fixdate form
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        let formatted = date.format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        if let Ok(value) = HeaderValue::from_str(&formatted) {
            self.headers.insert(DATE, value);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parse the `date` header, if present and readable
    pub fn date(&self) -> Option<DateTime<Utc>> {
        let raw = self.headers.get(DATE)?.to_str().ok()?;

        DateTime::parse_from_rfc2822(raw)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    pub fn is_offline(&self) -> bool {
        self.status == StatusCode::SERVICE_UNAVAILABLE && self.body.as_ref() == b"Offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_offline_response() {
        let response = ProxyResponse::offline();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body.as_ref(), b"Offline");
        assert!(response.is_offline());
        assert!(!response.is_success());
    }

    #[test]
    fn test_date_header_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(DATE, HeaderValue::from_static("Sun, 06 Nov 1994 08:49:37 GMT"));
        let response = ProxyResponse::new(StatusCode::OK, headers, "body");

        let expected = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(response.date(), Some(expected));
    }

    #[test]
    fn test_with_date_round_trips() {
        let date = Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap();
        let response = ProxyResponse::ok("hello").with_date(date);

        assert_eq!(response.date(), Some(date));
    }

    #[test]
    fn test_unreadable_date_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(DATE, HeaderValue::from_static("yesterday-ish"));
        let response = ProxyResponse::new(StatusCode::OK, headers, "");

        assert!(response.date().is_none());
        assert!(ProxyResponse::ok("").date().is_none());
    }
}
