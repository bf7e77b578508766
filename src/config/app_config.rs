use std::time::Duration as StdDuration;

use reqwest::Url;
use serde::Deserialize;

use crate::domain::proxy::{
    RoutingRules, DEFAULT_API_PREFIX, DEFAULT_FONT_HOSTS, DEFAULT_STATIC_EXTENSIONS,
};
use crate::domain::relevance::{ScoringConfig, ScoringWeights};
use crate::domain::DomainError;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::proxy::ProxyConfig;

/// Keys whose environment values are comma-separated lists
const LIST_KEYS: &[&str] = &[
    "proxy.manifest",
    "proxy.allowed_hosts",
    "proxy.font_hosts",
    "proxy.static_extensions",
];

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub proxy: ProxySettings,
    pub metrics: MetricsConfig,
    pub relevance: RelevanceSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Origin, versioning and routing of the cache proxy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Upstream site the proxy fronts
    pub origin: String,
    /// Version tag embedded in partition names
    pub version: String,
    pub cache_prefix: String,
    /// Critical resources cached at install, relative to the origin
    pub manifest: Vec<String>,
    pub allowed_hosts: Vec<String>,
    pub font_hosts: Vec<String>,
    pub static_extensions: Vec<String>,
    pub api_prefix: String,
    pub max_dynamic_age_secs: u64,
    /// Period of the `cache-cleanup` sync; 0 disables it
    pub sweep_interval_secs: u64,
    pub max_entries_per_partition: u64,
    pub connect_timeout_secs: Option<u64>,
}

/// Weights and decay of the related-content scorer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelevanceSettings {
    pub similarity_weight: f64,
    pub category_weight: f64,
    pub recency_weight: f64,
    pub half_life_days: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:3000".to_string(),
            version: "v1".to_string(),
            cache_prefix: "studio".to_string(),
            manifest: [
                "/",
                "/styles/critical.css",
                "/images/hero.webp",
                "/fonts/inter-regular.woff2",
                "/fonts/inter-bold.woff2",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            allowed_hosts: Vec::new(),
            font_hosts: DEFAULT_FONT_HOSTS.iter().map(|h| h.to_string()).collect(),
            static_extensions: DEFAULT_STATIC_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            max_dynamic_age_secs: 3600,
            sweep_interval_secs: 300,
            max_entries_per_partition: 10_000,
            connect_timeout_secs: None,
        }
    }
}

impl Default for RelevanceSettings {
    fn default() -> Self {
        let weights = ScoringWeights::default();

        Self {
            similarity_weight: weights.similarity,
            category_weight: weights.category,
            recency_weight: weights.recency,
            half_life_days: ScoringConfig::default().half_life_days,
        }
    }
}

impl ProxySettings {
    pub fn origin_url(&self) -> Result<Url, DomainError> {
        let origin = Url::parse(&self.origin).map_err(|e| {
            DomainError::configuration(format!("Invalid origin '{}': {}", self.origin, e))
        })?;

        if origin.host_str().is_none() {
            return Err(DomainError::configuration(format!(
                "Origin '{}' has no host",
                self.origin
            )));
        }

        Ok(origin)
    }

    /// Builds the settings of the worker version described by this section
    pub fn to_proxy_config(&self) -> Result<ProxyConfig, DomainError> {
        let origin = self.origin_url()?;
        let host = origin.host_str().unwrap_or_default().to_string();

        let rules = RoutingRules::new(
            host,
            self.allowed_hosts.clone(),
            self.font_hosts.clone(),
            &self.static_extensions,
            self.api_prefix.clone(),
        )?;

        let max_age = chrono::Duration::seconds(self.max_dynamic_age_secs as i64);
        let config = ProxyConfig::new(origin, &self.cache_prefix, self.version.clone());
        let manifest = config.resolve_urls(&self.manifest)?;

        Ok(config
            .with_rules(rules)
            .with_manifest(manifest)
            .with_max_dynamic_age(max_age))
    }

    pub fn sweep_interval(&self) -> Option<StdDuration> {
        (self.sweep_interval_secs > 0).then(|| StdDuration::from_secs(self.sweep_interval_secs))
    }

    pub fn connect_timeout(&self) -> Option<StdDuration> {
        self.connect_timeout_secs.map(StdDuration::from_secs)
    }
}

impl RelevanceSettings {
    pub fn to_scoring_config(&self) -> Result<ScoringConfig, DomainError> {
        let config = ScoringConfig {
            weights: ScoringWeights {
                similarity: self.similarity_weight,
                category: self.category_weight,
                recency: self.recency_weight,
            },
            half_life_days: self.half_life_days,
        };

        config.validate()?;
        Ok(config)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut environment = config::Environment::with_prefix("APP")
            .separator("__")
            .list_separator(",")
            .try_parsing(true);

        for key in LIST_KEYS {
            environment = environment.with_list_parse_key(key);
        }

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment)
            .build()?;

        config.try_deserialize()
    }
}
