//! HTTP infrastructure - Network access to the origin

mod client;

pub use client::{strip_hop_by_hop, HttpFetcher};
