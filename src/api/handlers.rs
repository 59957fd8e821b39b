use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::SessionId,
    models::{CacheSource, Section},
    services::{select_sections, CacheStatus},
};

use super::AppState;

// Response types

/// Everything the home page needs for one render
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub sections: Vec<Section>,
    pub provenance: CacheSource,
    pub generated_at: DateTime<Utc>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Trending sections for the home page
///
/// Never fails: an empty `sections` list is the designed empty state.
pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Json<HomeResponse> {
    let (aggregate, provenance) = state.trending.get_aggregate(&session).await;
    let sections = select_sections(&aggregate);

    tracing::info!(
        session = %session,
        provenance = %provenance,
        sections = sections.len(),
        "Home page trending served"
    );

    Json(HomeResponse {
        sections,
        provenance,
        generated_at: aggregate.generated_at,
    })
}

/// State of the durable tier and the caller's session tier
pub async fn cache_status(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Json<CacheStatus> {
    Json(state.trending.status(&session).await)
}

/// Drop the shared durable cache
pub async fn clear_durable_cache(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.trending.clear_durable().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Drop the caller's session cache
pub async fn clear_session_cache(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> AppResult<StatusCode> {
    state.trending.clear_session(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
