use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;
use crate::middleware::session_middleware;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API routes under /api/v1, all scoped to the caller's session
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/trending", get(handlers::home))
        // Cache inspection and maintenance
        .route("/trending/cache", get(handlers::cache_status))
        .route("/trending/cache/durable", delete(handlers::clear_durable_cache))
        .route("/trending/cache/session", delete(handlers::clear_session_cache))
        .layer(middleware::from_fn(session_middleware))
}
