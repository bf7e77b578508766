//! In-memory partitions using moka

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::cache::{CachePartition, CacheStorage};
use crate::domain::proxy::ProxyResponse;
use crate::domain::DomainError;

/// Configuration for in-memory partitions
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries per partition
    pub max_capacity: u64,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

/// A bounded partition; least recently used entries are dropped once the
/// capacity is reached
#[derive(Debug)]
pub struct InMemoryPartition {
    name: String,
    cache: MokaCache<String, ProxyResponse>,
}

impl InMemoryPartition {
    pub fn new(name: impl Into<String>, config: &InMemoryCacheConfig) -> Self {
        Self {
            name: name.into(),
            cache: MokaCache::builder().max_capacity(config.max_capacity).build(),
        }
    }
}

#[async_trait]
impl CachePartition for InMemoryPartition {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_url(&self, url: &str) -> Result<Option<ProxyResponse>, DomainError> {
        Ok(self.cache.get(url).await)
    }

    async fn put(&self, url: &str, response: ProxyResponse) -> Result<(), DomainError> {
        self.cache.insert(url.to_string(), response).await;
        Ok(())
    }

    async fn delete(&self, url: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(url).await.is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, DomainError> {
        self.cache.run_pending_tasks().await;

        Ok(self
            .cache
            .iter()
            .map(|(key, _)| key.as_ref().clone())
            .collect())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}

/// Registry of in-memory partitions keyed by name
#[derive(Debug, Default)]
pub struct InMemoryCacheStorage {
    partitions: RwLock<HashMap<String, Arc<InMemoryPartition>>>,
    config: InMemoryCacheConfig,
}

impl InMemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            config,
        }
    }
}

#[async_trait]
impl CacheStorage for InMemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CachePartition>, DomainError> {
        if let Some(partition) = self
            .partitions
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?
            .get(name)
        {
            return Ok(partition.clone());
        }

        let mut partitions = self
            .partitions
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;

        // Another caller may have created it between the two locks
        let partition = partitions
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(partition = name, "Creating cache partition");
                Arc::new(InMemoryPartition::new(name, &self.config))
            })
            .clone();

        Ok(partition)
    }

    async fn has(&self, name: &str) -> Result<bool, DomainError> {
        let partitions = self
            .partitions
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        Ok(partitions.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool, DomainError> {
        let removed = self
            .partitions
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?
            .remove(name);

        match removed {
            Some(partition) => {
                partition.clear().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, DomainError> {
        let partitions = self
            .partitions
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        let mut names: Vec<String> = partitions.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
