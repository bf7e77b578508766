//! Application state shared by the handlers

use std::sync::Arc;

use reqwest::Url;

use crate::domain::cache::CacheStorage;
use crate::domain::relevance::RelevanceScorer;
use crate::infrastructure::proxy::Registration;

/// Application state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<Registration>,
    pub storage: Arc<dyn CacheStorage>,
    pub scorer: Arc<RelevanceScorer>,
    /// Upstream site that proxied paths are resolved against
    pub origin: Url,
}

impl AppState {
    pub fn new(
        registration: Arc<Registration>,
        storage: Arc<dyn CacheStorage>,
        scorer: Arc<RelevanceScorer>,
        origin: Url,
    ) -> Self {
        Self {
            registration,
            storage,
            scorer,
            origin,
        }
    }
}
