//! Worker registration
//!
//! Hosts the installed worker versions of one origin: at most one active
//! worker serving requests and at most one installed worker waiting to take
//! over.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::domain::proxy::{
    ControlMessage, ControlOutcome, Fetcher, ProxyRequest, ProxyResponse, ServiceWorker,
    SweepReport, WorkerState,
};
use crate::domain::DomainError;

/// Result of registering a new worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// The worker took control immediately
    Activated,
    /// The worker is installed and waits for the active one to step down
    Waiting,
}

/// Version and state of a hosted worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerStatus {
    pub version: String,
    pub state: WorkerState,
}

impl WorkerStatus {
    fn of(worker: &dyn ServiceWorker) -> Self {
        Self {
            version: worker.version().to_string(),
            state: worker.state(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationStatus {
    pub active: Option<WorkerStatus>,
    pub waiting: Option<WorkerStatus>,
}

/// Lifecycle host for worker versions
pub struct Registration {
    active: RwLock<Option<Arc<dyn ServiceWorker>>>,
    waiting: RwLock<Option<Arc<dyn ServiceWorker>>>,
    /// Network used while no worker is active
    fetcher: Arc<dyn Fetcher>,
    /// Serializes install and activation
    transition: Mutex<()>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration").finish_non_exhaustive()
    }
}

impl Registration {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            active: RwLock::new(None),
            waiting: RwLock::new(None),
            fetcher,
            transition: Mutex::new(()),
        }
    }

    pub async fn active(&self) -> Option<Arc<dyn ServiceWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<dyn ServiceWorker>> {
        self.waiting.read().await.clone()
    }

    /// Installs a worker and activates it when nothing is active or it asked
    /// to skip waiting; otherwise it replaces any waiting worker
    ///
    /// A failed install retires the new worker and leaves the current ones
    /// untouched.
    pub async fn register(&self, worker: Arc<dyn ServiceWorker>) -> Result<Activation, DomainError> {
        let _transition = self.transition.lock().await;

        info!(version = %worker.version(), "Registering worker");

        if let Err(e) = worker.on_install().await {
            warn!(version = %worker.version(), error = %e, "Install failed, keeping previous worker");
            worker.retire();
            return Err(e);
        }

        let has_active = self.active.read().await.is_some();

        if !has_active || worker.skip_waiting_requested() {
            self.promote(worker).await?;
            return Ok(Activation::Activated);
        }

        if let Some(previous) = self.waiting.write().await.replace(worker.clone()) {
            debug!(version = %previous.version(), "Replacing waiting worker");
            previous.retire();
        }
        info!(version = %worker.version(), "Worker installed and waiting");

        Ok(Activation::Waiting)
    }

    /// Activates the waiting worker, if any
    pub async fn activate_waiting(&self) -> Result<Option<String>, DomainError> {
        let _transition = self.transition.lock().await;

        let Some(worker) = self.waiting.read().await.clone() else {
            return Ok(None);
        };

        self.promote(worker.clone()).await?;

        Ok(Some(worker.version().to_string()))
    }

    /// Asks the waiting worker to skip waiting and activates it
    pub async fn skip_waiting(&self) -> Result<Option<ControlOutcome>, DomainError> {
        let Some(worker) = self.waiting().await else {
            return Ok(None);
        };

        let outcome = worker.on_message(ControlMessage::SkipWaiting).await?;
        self.activate_waiting().await?;

        Ok(Some(outcome))
    }

    async fn promote(&self, worker: Arc<dyn ServiceWorker>) -> Result<(), DomainError> {
        if let Err(e) = worker.on_activate().await {
            warn!(version = %worker.version(), error = %e, "Activation failed");
            worker.retire();
            self.clear_waiting_if(&worker).await;
            return Err(e);
        }

        self.clear_waiting_if(&worker).await;

        if let Some(previous) = self.active.write().await.replace(worker.clone()) {
            info!(from = %previous.version(), to = %worker.version(), "Worker replaced");
            previous.retire();
        }

        // A worker still waiting is older than the one just activated
        if let Some(stale) = self.waiting.write().await.take() {
            stale.retire();
        }

        Ok(())
    }

    async fn clear_waiting_if(&self, worker: &Arc<dyn ServiceWorker>) {
        let mut waiting = self.waiting.write().await;

        if waiting.as_ref().is_some_and(|w| Arc::ptr_eq(w, worker)) {
            waiting.take();
        }
    }

    /// Routes a request through the active worker, or straight to the
    /// network when no worker controls the origin
    pub async fn handle_fetch(&self, request: ProxyRequest) -> ProxyResponse {
        if let Some(worker) = self.active().await {
            return worker.on_fetch(request).await;
        }

        match self.fetcher.fetch(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "Uncontrolled fetch failed");
                ProxyResponse::offline()
            }
        }
    }

    /// Delivers a control message
    ///
    /// `SKIP_WAITING` goes to the waiting worker and activates it; the
    /// others go to the active worker.
    pub async fn post_message(&self, message: ControlMessage) -> Result<ControlOutcome, DomainError> {
        if message == ControlMessage::SkipWaiting {
            if let Some(outcome) = self.skip_waiting().await? {
                return Ok(outcome);
            }
        }

        let worker = self
            .active()
            .await
            .ok_or_else(|| DomainError::not_found("No active worker"))?;

        worker.on_message(message).await
    }

    /// Fires a background-sync event at the active worker
    pub async fn sync(&self, tag: &str, now: DateTime<Utc>) -> Result<SweepReport, DomainError> {
        match self.active().await {
            Some(worker) => worker.on_sync(tag, now).await,
            None => Ok(SweepReport::default()),
        }
    }

    pub async fn status(&self) -> RegistrationStatus {
        RegistrationStatus {
            active: self.active().await.map(|w| WorkerStatus::of(w.as_ref())),
            waiting: self.waiting().await.map(|w| WorkerStatus::of(w.as_ref())),
        }
    }
}
