//! Edge control endpoints: worker messages, cache status and related
//! content ranking

use axum::{extract::State, routing::get, routing::post, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::state::AppState;
use super::types::{ApiError, Json};
use crate::domain::proxy::{ControlMessage, ControlOutcome};
use crate::domain::relevance::{Document, ScoredDocument};
use crate::infrastructure::observability::record_ranking;
use crate::infrastructure::proxy::RegistrationStatus;

pub fn create_edge_router() -> Router<AppState> {
    Router::new()
        .route("/control", post(post_control))
        .route("/status", get(get_status))
        .route("/related", post(post_related))
}

/// Delivers a control message to the hosted workers
pub async fn post_control(
    State(state): State<AppState>,
    Json(message): Json<ControlMessage>,
) -> Result<Json<ControlOutcome>, ApiError> {
    info!(message = ?message, "Control message received");

    let outcome = state.registration.post_message(message).await?;

    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct PartitionStatus {
    pub name: String,
    pub entries: usize,
}

#[derive(Debug, Serialize)]
pub struct EdgeStatus {
    #[serde(flatten)]
    pub registration: RegistrationStatus,
    pub partitions: Vec<PartitionStatus>,
}

pub async fn get_status(State(state): State<AppState>) -> Result<Json<EdgeStatus>, ApiError> {
    let mut partitions = Vec::new();

    for name in state.storage.keys().await? {
        let entries = state.storage.open(&name).await?.len().await?;
        partitions.push(PartitionStatus { name, entries });
    }

    Ok(Json(EdgeStatus {
        registration: state.registration.status().await,
        partitions,
    }))
}

/// A ranking request: the document being viewed and the candidate pool
#[derive(Debug, Clone, Deserialize)]
pub struct RelatedRequest {
    pub current: Document,
    #[serde(default)]
    pub candidates: Vec<Document>,
    /// Keyword universe; extracted from `current` when absent
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    /// Maximum number of results
    #[serde(default)]
    pub top: Option<usize>,
}

impl RelatedRequest {
    /// Every document needs a non-empty id and text
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_document(&self.current, "current")?;

        for (i, candidate) in self.candidates.iter().enumerate() {
            validate_document(candidate, &format!("candidates[{}]", i))?;
        }

        Ok(())
    }
}

fn validate_document(document: &Document, field: &str) -> Result<(), ApiError> {
    if document.id.trim().is_empty() {
        return Err(ApiError::bad_request("Document id must not be empty")
            .with_param(format!("{}.id", field)));
    }

    if document.text.trim().is_empty() {
        return Err(ApiError::bad_request("Document text must not be empty")
            .with_param(format!("{}.text", field)));
    }

    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelatedResponse {
    pub current: String,
    pub results: Vec<ScoredDocument>,
}

/// Ranks candidates as related content for the current document
pub async fn post_related(
    State(state): State<AppState>,
    Json(request): Json<RelatedRequest>,
) -> Result<Json<RelatedResponse>, ApiError> {
    request.validate()?;

    let mut results = state.scorer.rank(
        &request.current,
        &request.candidates,
        request.keywords.as_deref(),
    );

    if let Some(top) = request.top {
        results.truncate(top);
    }

    record_ranking(request.candidates.len());

    Ok(Json(RelatedResponse {
        current: request.current.id,
        results,
    }))
}
