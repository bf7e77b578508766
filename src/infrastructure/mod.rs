//! Infrastructure layer - Cache storage, network access and the proxy runtime

pub mod cache;
pub mod http;
pub mod logging;
pub mod observability;
pub mod proxy;
