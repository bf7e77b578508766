//! Cache proxy runtime - worker engine, registration and settings

mod config;
mod engine;
mod registration;

pub use config::{resolve_urls, ProxyConfig, CLEANUP_SYNC_TAG};
pub use engine::CacheProxy;
pub use registration::{Activation, Registration, RegistrationStatus, WorkerStatus};
