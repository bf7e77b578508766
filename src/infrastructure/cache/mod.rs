//! Cache infrastructure - Partition storage implementations

mod in_memory;

pub use in_memory::{InMemoryCacheConfig, InMemoryCacheStorage, InMemoryPartition};
