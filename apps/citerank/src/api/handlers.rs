//! # API Endpoint Handlers
//!
//! All handlers are read-only views over the rank database.

use super::{
    AppState,
    types::{
        CitationsResponse, ErrorResponse, HealthResponse, PaperJson, PaperResponse,
        StatusResponse, TopQuery, TopResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use citerank_core::CiteRankError;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal_error(e: CiteRankError) -> ApiError {
    tracing::error!("Database read failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!("Database error: {}", e))),
    )
}

fn not_found(id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("Paper not found: {}", id))),
    )
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Counts stored by the last build.
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = state.db.status().map_err(internal_error)?;
    Ok(Json(status.into()))
}

// =============================================================================
// PAPER HANDLERS
// =============================================================================

/// Highest-ranked papers. `limit` defaults to 10 and is capped at 1000.
pub async fn top_handler(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<TopResponse>, ApiError> {
    let limit = query.effective_limit();
    let papers = state.db.top(limit).map_err(internal_error)?;

    Ok(Json(TopResponse {
        limit,
        papers: papers.into_iter().map(PaperJson::from).collect(),
    }))
}

/// One paper by external id, with its stored details.
pub async fn paper_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaperResponse>, ApiError> {
    let paper = state
        .db
        .paper(&id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found(&id))?;
    let details = state.db.details(&paper.url).map_err(internal_error)?;

    Ok(Json(PaperResponse {
        paper: paper.into(),
        details,
    }))
}

/// A paper's citing and cited neighbours.
pub async fn citations_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CitationsResponse>, ApiError> {
    let citations = state
        .db
        .citations(&id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(citations.into()))
}
