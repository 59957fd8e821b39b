use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures inside a content provider
///
/// These never leave the provider layer: `providers::fetch_trending` logs them
/// and yields an empty item list instead.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to decode upstream payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No API key configured for {0}")]
    MissingApiKey(&'static str),
}

/// Failures inside a cache store
///
/// The cache manager absorbs these; a broken store degrades to a cache miss.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Application-level errors surfaced by HTTP handlers
///
/// Only the cache maintenance endpoints can fail; the home-page path degrades
/// silently instead.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
pub type FetchResult<T> = Result<T, FetchError>;
pub type CacheResult<T> = Result<T, CacheError>;
