//! Domain layer - Core types, traits and algorithms

pub mod cache;
pub mod error;
pub mod proxy;
pub mod relevance;

pub use cache::{CachePartition, CacheStorage};
pub use error::DomainError;
pub use proxy::{
    CacheStrategy, ControlMessage, ControlOutcome, Fetcher, PartitionKind, PartitionNames,
    ProxyRequest, ProxyResponse, Route, RoutingRules, ServiceWorker, SweepReport, WorkerState,
};
pub use relevance::{
    Document, RelevanceScorer, ScoreBreakdown, ScoredDocument, ScoringConfig, ScoringWeights,
};
