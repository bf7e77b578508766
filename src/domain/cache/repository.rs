//! Partition and storage traits

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::proxy::ProxyResponse;
use crate::domain::DomainError;

/// A named store of request URL to response pairs
#[async_trait]
pub trait CachePartition: Send + Sync + Debug {
    /// Name of the partition
    fn name(&self) -> &str;

    /// Looks up the response stored for a request URL
    async fn match_url(&self, url: &str) -> Result<Option<ProxyResponse>, DomainError>;

    /// Stores a response, replacing any previous entry for the URL
    async fn put(&self, url: &str, response: ProxyResponse) -> Result<(), DomainError>;

    /// Removes an entry, returning whether it existed
    async fn delete(&self, url: &str) -> Result<bool, DomainError>;

    /// Lists the stored request URLs
    async fn keys(&self) -> Result<Vec<String>, DomainError>;

    /// Number of stored entries
    async fn len(&self) -> Result<usize, DomainError>;

    /// Removes every entry
    async fn clear(&self) -> Result<(), DomainError>;

    async fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len().await? == 0)
    }

    /// Stores several responses, or none of them
    ///
    /// On a failed write the entries already written are restored to what
    /// the partition held before the call.
    async fn put_all(&self, entries: Vec<(String, ProxyResponse)>) -> Result<(), DomainError> {
        let mut written: Vec<(String, Option<ProxyResponse>)> = Vec::with_capacity(entries.len());

        for (url, response) in entries {
            let previous = self.match_url(&url).await?;

            if let Err(e) = self.put(&url, response).await {
                for (url, previous) in written.into_iter().rev() {
                    let restored = match previous {
                        Some(previous) => self.put(&url, previous).await,
                        None => self.delete(&url).await.map(|_| ()),
                    };

                    if let Err(undo) = restored {
                        warn!(partition = self.name(), url = %url, error = %undo, "Failed to roll back entry");
                    }
                }

                return Err(e);
            }

            written.push((url, previous));
        }

        Ok(())
    }
}

/// Registry of named partitions; one instance per name
#[async_trait]
pub trait CacheStorage: Send + Sync + Debug {
    /// Opens a partition, creating it on first use
    async fn open(&self, name: &str) -> Result<Arc<dyn CachePartition>, DomainError>;

    async fn has(&self, name: &str) -> Result<bool, DomainError>;

    /// Deletes a partition and its entries, returning whether it existed
    async fn delete(&self, name: &str) -> Result<bool, DomainError>;

    /// Lists partition names
    async fn keys(&self) -> Result<Vec<String>, DomainError>;
}
