//! Request classification
//!
//! Decides, for each intercepted request, whether the proxy handles it and
//! with which strategy and partition.

use std::fmt;

use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::request::ProxyRequest;
use crate::domain::DomainError;

/// Request-serving policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    /// Serve from the partition, go to the network only on a miss
    CacheFirst,
    /// Go to the network, fall back to the partition on failure
    NetworkFirst,
    /// Serve from the partition and refresh it in the background
    StaleWhileRevalidate,
}

impl CacheStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheFirst => "cache_first",
            Self::NetworkFirst => "network_first",
            Self::StaleWhileRevalidate => "stale_while_revalidate",
        }
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the current partitions a route reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    Static,
    Dynamic,
    Versioned,
}

/// Outcome of classifying a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; forwarded to the network untouched
    Passthrough,
    Cached {
        strategy: CacheStrategy,
        partition: PartitionKind,
    },
}

impl Route {
    fn cached(strategy: CacheStrategy, partition: PartitionKind) -> Self {
        Self::Cached {
            strategy,
            partition,
        }
    }
}

pub const DEFAULT_STATIC_EXTENSIONS: &[&str] = &[
    "js", "css", "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "woff", "woff2",
    "ttf", "otf", "eot",
];

pub const DEFAULT_FONT_HOSTS: &[&str] = &["fonts.googleapis.com", "fonts.gstatic.com"];

pub const DEFAULT_API_PREFIX: &str = "/api/";

/// Routing table for intercepted requests
#[derive(Debug, Clone)]
pub struct RoutingRules {
    origin_host: String,
    allowed_hosts: Vec<String>,
    font_hosts: Vec<String>,
    api_prefix: String,
    static_pattern: Regex,
}

impl RoutingRules {
    /// Build rules for an origin host using the default asset extensions,
    /// font hosts and API prefix
    pub fn for_origin(origin_host: impl Into<String>) -> Self {
        let extensions: Vec<String> = DEFAULT_STATIC_EXTENSIONS
            .iter()
            .map(|e| e.to_string())
            .collect();

        Self::new(
            origin_host,
            Vec::new(),
            DEFAULT_FONT_HOSTS.iter().map(|h| h.to_string()).collect(),
            &extensions,
            DEFAULT_API_PREFIX,
        )
        .expect("default static extensions form a valid pattern")
    }

    pub fn new(
        origin_host: impl Into<String>,
        allowed_hosts: Vec<String>,
        font_hosts: Vec<String>,
        static_extensions: &[String],
        api_prefix: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if static_extensions.is_empty() {
            return Err(DomainError::configuration(
                "At least one static asset extension is required",
            ));
        }

        let alternatives = static_extensions
            .iter()
            .map(|e| regex::escape(e.trim_start_matches('.')))
            .collect::<Vec<_>>()
            .join("|");

        let static_pattern = Regex::new(&format!(r"(?i)\.({})$", alternatives)).map_err(|e| {
            DomainError::configuration(format!("Invalid static extension pattern: {}", e))
        })?;

        Ok(Self {
            origin_host: origin_host.into().to_lowercase(),
            allowed_hosts: lowercase_all(allowed_hosts),
            font_hosts: lowercase_all(font_hosts),
            api_prefix: api_prefix.into(),
            static_pattern,
        })
    }

    /// Classify a request, in order: non-GET or non-HTTP schemes and foreign
    /// hosts pass through; static assets and font hosts are cache-first;
    /// HTML documents are network-first; API calls are
    /// stale-while-revalidate; everything else is network-first.
    pub fn classify(&self, request: &ProxyRequest) -> Route {
        if request.method != Method::GET {
            return Route::Passthrough;
        }

        if !matches!(request.url.scheme(), "http" | "https") {
            return Route::Passthrough;
        }

        let host = request.host().map(|h| h.to_lowercase()).unwrap_or_default();

        if !self.is_intercepted_host(&host) {
            return Route::Passthrough;
        }

        if self.static_pattern.is_match(request.path()) || self.is_font_host(&host) {
            return Route::cached(CacheStrategy::CacheFirst, PartitionKind::Static);
        }

        if request.accepts_html() {
            return Route::cached(CacheStrategy::NetworkFirst, PartitionKind::Dynamic);
        }

        if request.path().starts_with(&self.api_prefix) {
            return Route::cached(CacheStrategy::StaleWhileRevalidate, PartitionKind::Dynamic);
        }

        Route::cached(CacheStrategy::NetworkFirst, PartitionKind::Dynamic)
    }

    fn is_font_host(&self, host: &str) -> bool {
        self.font_hosts.iter().any(|h| h == host)
    }

    fn is_intercepted_host(&self, host: &str) -> bool {
        host == self.origin_host
            || self.is_font_host(host)
            || self.allowed_hosts.iter().any(|h| h == host)
    }
}

fn lowercase_all(hosts: Vec<String>) -> Vec<String> {
    hosts.into_iter().map(|h| h.to_lowercase()).collect()
}
