//! Control messages posted by the page to the proxy

use serde::{Deserialize, Serialize};

/// Control channel commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate a waiting worker without waiting for clients to close
    SkipWaiting,
    /// Add the given URLs to the static partition
    CacheUrls { urls: Vec<String> },
    /// Drop the current partitions and re-run the install manifest
    ClearCache,
}

/// Result reported back to the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlOutcome {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<usize>,
}

impl ControlOutcome {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cached: None,
        }
    }

    pub fn with_cached(mut self, count: usize) -> Self {
        self.cached = Some(count);
        self
    }
}
