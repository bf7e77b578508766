//! Cache domain - named partitions of stored responses

mod repository;

pub use repository::{CachePartition, CacheStorage};

#[cfg(test)]
pub use repository::mock::ReadOnlyStorage;
