//! Worker lifecycle

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::control::{ControlMessage, ControlOutcome};
use super::request::ProxyRequest;
use super::response::ProxyResponse;
use crate::domain::DomainError;

/// Lifecycle state of one worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Fetching and storing the install manifest
    Installing,
    /// Installed, waiting for the previous version to step down
    Installed,
    /// Controlling requests
    Active,
    /// Failed to install or replaced by a newer version
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Active => "active",
            Self::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Summary of an eviction sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub evicted: usize,
}

/// Event handlers of a request-intercepting worker
///
/// The hosting runtime calls `on_install` once, then `on_activate` when the
/// worker takes control, then `on_fetch` for every intercepted request.
#[async_trait]
pub trait ServiceWorker: Send + Sync {
    fn version(&self) -> &str;

    fn state(&self) -> WorkerState;

    /// Whether the worker asked to activate without waiting
    fn skip_waiting_requested(&self) -> bool;

    async fn on_install(&self) -> Result<(), DomainError>;

    async fn on_activate(&self) -> Result<(), DomainError>;

    /// Answer a request; never fails
    async fn on_fetch(&self, request: ProxyRequest) -> ProxyResponse;

    async fn on_message(&self, message: ControlMessage) -> Result<ControlOutcome, DomainError>;

    /// Cooperative background-sync trigger
    async fn on_sync(&self, tag: &str, now: DateTime<Utc>) -> Result<SweepReport, DomainError>;

    /// Mark the worker redundant after a failed install or replacement
    fn retire(&self);
}
