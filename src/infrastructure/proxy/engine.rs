//! Cache proxy worker
//!
//! One `CacheProxy` is one worker version: it owns the partition names of
//! its version, routes every intercepted request to a caching strategy and
//! keeps the dynamic partition fresh with a date-based sweep.
//!
//! Concurrent requests for the same key are not coalesced; both may miss,
//! fetch and store, and the last write wins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use reqwest::Url;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::config::ProxyConfig;
use crate::domain::cache::{CachePartition, CacheStorage};
use crate::domain::proxy::{
    CacheStrategy, ControlMessage, ControlOutcome, Fetcher, PartitionKind, ProxyRequest,
    ProxyResponse, Route, ServiceWorker, SweepReport, WorkerState,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_cache_request, record_evictions};

/// A caching worker for one version of the site
pub struct CacheProxy {
    config: ProxyConfig,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    revalidations: Mutex<JoinSet<()>>,
}

impl std::fmt::Debug for CacheProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheProxy")
            .field("version", &self.config.version)
            .field("state", &self.state())
            .finish()
    }
}

impl CacheProxy {
    pub fn new(
        config: ProxyConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config,
            storage,
            fetcher,
            state: RwLock::new(WorkerState::Installing),
            skip_waiting: AtomicBool::new(false),
            revalidations: Mutex::new(JoinSet::new()),
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    fn set_state(&self, state: WorkerState) {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        *guard = state;
    }

    async fn partition(&self, kind: PartitionKind) -> Result<Arc<dyn CachePartition>, DomainError> {
        self.storage.open(self.config.names.name_for(kind)).await
    }

    /// Serves a request; cache failures degrade to misses and network
    /// failures to the offline response
    ///
    /// A retired worker no longer touches its partitions, which the newer
    /// version may already have deleted.
    pub async fn handle(&self, request: ProxyRequest) -> ProxyResponse {
        if self.state() == WorkerState::Redundant {
            debug!(version = %self.config.version, url = %request.url, "Retired worker, going to network");
            return self.passthrough(&request).await;
        }

        match self.config.rules.classify(&request) {
            Route::Passthrough => self.passthrough(&request).await,
            Route::Cached {
                strategy,
                partition,
            } => {
                let partition = match self.partition(partition).await {
                    Ok(partition) => partition,
                    Err(e) => {
                        warn!(error = %e, "Cache unavailable, going to network");
                        return self.passthrough(&request).await;
                    }
                };

                match strategy {
                    CacheStrategy::CacheFirst => self.cache_first(&request, partition).await,
                    CacheStrategy::NetworkFirst => self.network_first(&request, partition).await,
                    CacheStrategy::StaleWhileRevalidate => {
                        self.stale_while_revalidate(&request, partition).await
                    }
                }
            }
        }
    }

    async fn passthrough(&self, request: &ProxyRequest) -> ProxyResponse {
        record_cache_request(None, "passthrough");

        match self.fetcher.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "Passthrough fetch failed");
                ProxyResponse::offline()
            }
        }
    }

    /// Looks in the route's partition first, then in the other current
    /// partitions, so precached documents also answer dynamic routes
    async fn lookup(&self, primary: &dyn CachePartition, key: &str) -> Option<ProxyResponse> {
        if let Some(found) = match_in(primary, key).await {
            return Some(found);
        }

        for name in self.config.names.all() {
            if name == primary.name() || !self.storage.has(name).await.unwrap_or(false) {
                continue;
            }

            if let Ok(partition) = self.storage.open(name).await {
                if let Some(found) = match_in(partition.as_ref(), key).await {
                    return Some(found);
                }
            }
        }

        None
    }

    async fn cache_first(
        &self,
        request: &ProxyRequest,
        partition: Arc<dyn CachePartition>,
    ) -> ProxyResponse {
        let strategy = Some(CacheStrategy::CacheFirst);
        let key = request.cache_key();

        if let Some(cached) = self.lookup(partition.as_ref(), &key).await {
            debug!(url = %key, "Cache hit");
            record_cache_request(strategy, "hit");
            return cached;
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    store(self.storage.as_ref(), partition.as_ref(), &key, response.clone()).await;
                }
                record_cache_request(strategy, "miss");
                response
            }
            Err(e) => {
                warn!(url = %key, error = %e, "Network unavailable for cache-first request");
                record_cache_request(strategy, "offline");
                ProxyResponse::offline()
            }
        }
    }

    async fn network_first(
        &self,
        request: &ProxyRequest,
        partition: Arc<dyn CachePartition>,
    ) -> ProxyResponse {
        let strategy = Some(CacheStrategy::NetworkFirst);
        let key = request.cache_key();

        let live = match self.fetcher.fetch(request).await {
            Ok(response) if response.is_success() => {
                store(self.storage.as_ref(), partition.as_ref(), &key, response.clone()).await;
                record_cache_request(strategy, "network");
                return response;
            }
            Ok(response) => Some(response),
            Err(e) => {
                debug!(url = %key, error = %e, "Network failed, trying cache");
                None
            }
        };

        if let Some(cached) = self.lookup(partition.as_ref(), &key).await {
            record_cache_request(strategy, "fallback");
            return cached;
        }

        match live {
            Some(response) => {
                record_cache_request(strategy, "network");
                response
            }
            None => {
                record_cache_request(strategy, "offline");
                ProxyResponse::offline()
            }
        }
    }

    async fn stale_while_revalidate(
        &self,
        request: &ProxyRequest,
        partition: Arc<dyn CachePartition>,
    ) -> ProxyResponse {
        let strategy = Some(CacheStrategy::StaleWhileRevalidate);
        let key = request.cache_key();

        if let Some(cached) = self.lookup(partition.as_ref(), &key).await {
            self.revalidate_in_background(request.clone(), partition);
            record_cache_request(strategy, "hit");
            return cached;
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    store(self.storage.as_ref(), partition.as_ref(), &key, response.clone()).await;
                }
                record_cache_request(strategy, "miss");
                response
            }
            Err(e) => {
                warn!(url = %key, error = %e, "Network unavailable for uncached request");
                record_cache_request(strategy, "offline");
                ProxyResponse::offline()
            }
        }
    }

    fn revalidate_in_background(&self, request: ProxyRequest, partition: Arc<dyn CachePartition>) {
        let fetcher = self.fetcher.clone();
        let storage = self.storage.clone();
        let mut revalidations = self.revalidations.lock().unwrap_or_else(|e| e.into_inner());

        // Reap finished tasks so the set does not grow without bound
        while revalidations.try_join_next().is_some() {}

        revalidations.spawn(async move {
            let key = request.cache_key();

            match fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    if store(storage.as_ref(), partition.as_ref(), &key, response).await {
                        debug!(url = %key, "Revalidated cache entry");
                    }
                }
                Ok(response) => {
                    debug!(url = %key, status = response.status.as_u16(), "Revalidation not stored");
                }
                Err(e) => {
                    debug!(url = %key, error = %e, "Revalidation failed");
                }
            }
        });
    }

    /// Waits for every background revalidation started so far
    pub async fn wait_for_revalidations(&self) {
        let mut pending = {
            let mut revalidations = self.revalidations.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *revalidations)
        };

        while pending.join_next().await.is_some() {}
    }

    /// Fetches every URL and stores all of them in the static partition, or
    /// none if any fetch fails or answers with a non-2xx status
    pub async fn precache(&self, urls: &[Url]) -> Result<usize, DomainError> {
        let fetches = urls.iter().map(|url| {
            let request = ProxyRequest::get(url.clone());

            async move {
                let response = self.fetcher.fetch(&request).await?;

                if !response.is_success() {
                    return Err(DomainError::install(format!(
                        "{} answered {}",
                        request.url, response.status
                    )));
                }

                Ok((request.cache_key(), response))
            }
        });

        let entries = try_join_all(fetches).await?;
        let count = entries.len();

        self.partition(PartitionKind::Static)
            .await?
            .put_all(entries)
            .await?;

        Ok(count)
    }

    /// Deletes every partition that does not belong to this version
    pub async fn purge_stale_partitions(&self) -> Result<Vec<String>, DomainError> {
        let mut purged = Vec::new();

        for name in self.storage.keys().await? {
            if !self.config.names.is_current(&name) && self.storage.delete(&name).await? {
                info!(partition = %name, "Deleted stale cache partition");
                purged.push(name);
            }
        }

        Ok(purged)
    }

    /// Evicts dynamic entries whose `date` header is more than the maximum
    /// age before `now`; entries without a readable date are kept
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, DomainError> {
        let partition = self.partition(PartitionKind::Dynamic).await?;
        let mut report = SweepReport::default();

        for key in partition.keys().await? {
            let Some(response) = partition.match_url(&key).await? else {
                continue;
            };
            report.examined += 1;

            let Some(date) = response.date() else {
                continue;
            };

            if now - date > self.config.max_dynamic_age && partition.delete(&key).await? {
                report.evicted += 1;
            }
        }

        if report.evicted > 0 {
            info!(evicted = report.evicted, examined = report.examined, "Swept dynamic cache");
            record_evictions(report.evicted);
        }

        Ok(report)
    }

    async fn clear_and_repopulate(&self) -> Result<usize, DomainError> {
        for name in self.config.names.all() {
            self.storage.delete(name).await?;
        }

        for kind in [PartitionKind::Static, PartitionKind::Dynamic, PartitionKind::Versioned] {
            self.partition(kind).await?;
        }

        self.precache(&self.config.manifest).await
    }
}

async fn match_in(partition: &dyn CachePartition, key: &str) -> Option<ProxyResponse> {
    match partition.match_url(key).await {
        Ok(found) => found,
        Err(e) => {
            warn!(partition = partition.name(), url = key, error = %e, "Cache lookup failed");
            None
        }
    }
}

/// Writes a response unless its partition has been deleted since it was
/// opened; returns whether the entry was stored
async fn store(
    storage: &dyn CacheStorage,
    partition: &dyn CachePartition,
    key: &str,
    response: ProxyResponse,
) -> bool {
    if !storage.has(partition.name()).await.unwrap_or(false) {
        debug!(partition = partition.name(), url = key, "Partition deleted, response not stored");
        return false;
    }

    match partition.put(key, response).await {
        Ok(()) => true,
        Err(e) => {
            warn!(partition = partition.name(), url = key, error = %e, "Failed to store response");
            false
        }
    }
}

#[async_trait]
impl ServiceWorker for CacheProxy {
    fn version(&self) -> &str {
        &self.config.version
    }

    fn state(&self) -> WorkerState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    async fn on_install(&self) -> Result<(), DomainError> {
        self.set_state(WorkerState::Installing);
        info!(version = %self.config.version, manifest = self.config.manifest.len(), "Installing");

        for kind in [PartitionKind::Static, PartitionKind::Dynamic, PartitionKind::Versioned] {
            self.partition(kind).await?;
        }

        let cached = self
            .precache(&self.config.manifest)
            .await
            .map_err(|e| DomainError::install(format!("Manifest could not be cached: {}", e)))?;

        self.set_state(WorkerState::Installed);
        info!(version = %self.config.version, cached, "Installed");

        Ok(())
    }

    async fn on_activate(&self) -> Result<(), DomainError> {
        let purged = self.purge_stale_partitions().await?;

        // Background sync may never fire, so sweep once here as well
        self.sweep(Utc::now()).await?;

        self.set_state(WorkerState::Active);
        info!(version = %self.config.version, purged = purged.len(), "Activated");

        Ok(())
    }

    async fn on_fetch(&self, request: ProxyRequest) -> ProxyResponse {
        self.handle(request).await
    }

    async fn on_message(&self, message: ControlMessage) -> Result<ControlOutcome, DomainError> {
        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting.store(true, Ordering::SeqCst);
                Ok(ControlOutcome::new("skip waiting requested"))
            }
            ControlMessage::CacheUrls { urls } => {
                let urls = self.config.resolve_urls(&urls)?;
                let cached = self.precache(&urls).await?;

                Ok(ControlOutcome::new("urls cached").with_cached(cached))
            }
            ControlMessage::ClearCache => {
                let cached = self.clear_and_repopulate().await?;
                info!(version = %self.config.version, cached, "Cache cleared and repopulated");

                Ok(ControlOutcome::new("cache cleared").with_cached(cached))
            }
        }
    }

    async fn on_sync(&self, tag: &str, now: DateTime<Utc>) -> Result<SweepReport, DomainError> {
        if tag != self.config.cleanup_tag {
            debug!(tag, "Ignoring unknown sync tag");
            return Ok(SweepReport::default());
        }

        self.sweep(now).await
    }

    fn retire(&self) {
        self.set_state(WorkerState::Redundant);
    }
}
