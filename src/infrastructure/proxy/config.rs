//! Per-version proxy settings

use chrono::Duration;
use reqwest::Url;

use crate::domain::proxy::{PartitionNames, RoutingRules};
use crate::domain::DomainError;

/// Sync tag that triggers the dynamic-partition sweep
pub const CLEANUP_SYNC_TAG: &str = "cache-cleanup";

/// Settings of one worker version
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub origin: Url,
    pub version: String,
    pub names: PartitionNames,
    /// Critical resources stored at install time
    pub manifest: Vec<Url>,
    pub rules: RoutingRules,
    /// Dynamic entries older than this are evicted by the sweep
    pub max_dynamic_age: Duration,
    pub cleanup_tag: String,
}

impl ProxyConfig {
    pub fn new(origin: Url, prefix: &str, version: impl Into<String>) -> Self {
        let version = version.into();
        let host = origin.host_str().unwrap_or_default().to_string();

        Self {
            names: PartitionNames::new(prefix, &version),
            rules: RoutingRules::for_origin(host),
            origin,
            version,
            manifest: Vec::new(),
            max_dynamic_age: Duration::hours(1),
            cleanup_tag: CLEANUP_SYNC_TAG.to_string(),
        }
    }

    pub fn with_manifest(mut self, manifest: Vec<Url>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn with_rules(mut self, rules: RoutingRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_max_dynamic_age(mut self, age: Duration) -> Self {
        self.max_dynamic_age = age;
        self
    }

    /// Resolves page-relative or absolute URLs against the origin
    pub fn resolve_urls<S: AsRef<str>>(&self, urls: &[S]) -> Result<Vec<Url>, DomainError> {
        resolve_urls(&self.origin, urls)
    }
}

pub fn resolve_urls<S: AsRef<str>>(origin: &Url, urls: &[S]) -> Result<Vec<Url>, DomainError> {
    urls.iter()
        .map(|url| {
            origin.join(url.as_ref()).map_err(|e| {
                DomainError::validation(format!("Invalid URL '{}': {}", url.as_ref(), e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = ProxyConfig::new(Url::parse("https://studio.example").unwrap(), "studio", "v1");

        let urls = config
            .resolve_urls(&["/", "/fonts/inter.woff2", "https://fonts.gstatic.com/s/inter.woff2"])
            .unwrap();

        assert_eq!(urls[0].as_str(), "https://studio.example/");
        assert_eq!(urls[1].as_str(), "https://studio.example/fonts/inter.woff2");
        assert_eq!(urls[2].as_str(), "https://fonts.gstatic.com/s/inter.woff2");
    }

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::new(Url::parse("https://studio.example").unwrap(), "studio", "v7");

        assert_eq!(config.names.static_name, "studio-static-v7");
        assert_eq!(config.max_dynamic_age, Duration::hours(1));
        assert_eq!(config.cleanup_tag, "cache-cleanup");
        assert!(config.manifest.is_empty());
    }
}
