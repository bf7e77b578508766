//! Cache proxy domain - request routing, strategies and worker lifecycle

mod control;
mod fetcher;
mod lifecycle;
mod names;
mod request;
mod response;
mod route;

pub use control::{ControlMessage, ControlOutcome};
pub use fetcher::Fetcher;
pub use lifecycle::{ServiceWorker, SweepReport, WorkerState};
pub use names::PartitionNames;
pub use request::ProxyRequest;
pub use response::ProxyResponse;
pub use route::{
    CacheStrategy, PartitionKind, Route, RoutingRules, DEFAULT_API_PREFIX, DEFAULT_FONT_HOSTS,
    DEFAULT_STATIC_EXTENSIONS,
};

#[cfg(test)]
pub use fetcher::mock::StubFetcher;
#[cfg(test)]
pub use fetcher::MockFetcher;
