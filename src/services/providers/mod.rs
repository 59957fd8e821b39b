/// Trending content provider abstraction
///
/// Each provider queries one external catalog (Jikan, TMDb, Google Books, iTunes)
/// and maps its payload into the shared `TrendingItem` shape. Providers are
/// best-effort: every failure collapses into an empty list at the trait boundary
/// so one dead upstream never breaks the home page.
use rand::seq::SliceRandom;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::{
    error::{FetchError, FetchResult},
    models::{Category, TrendingItem},
};

pub mod google_books;
pub mod itunes;
pub mod jikan;
pub mod tmdb;

pub use google_books::GoogleBooksProvider;
pub use itunes::ItunesProvider;
pub use jikan::JikanProvider;
pub use tmdb::TmdbProvider;

/// Trait for trending content providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TrendingProvider: Send + Sync {
    /// Category this provider fills in the aggregate
    fn category(&self) -> Category;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;

    /// Fetch up to `fetch_count` upstream candidates and normalize them
    ///
    /// Returns items in upstream order with unusable candidates dropped.
    async fn fetch_items(&self, fetch_count: usize) -> FetchResult<Vec<TrendingItem>>;
}

/// Fetches from one provider, then shuffles and truncates to `limit`
///
/// Every failure is absorbed into an empty list. Callers building the cached
/// aggregate pass `limit == fetch_count` so the full fetched set is retained.
pub async fn fetch_trending(
    provider: &dyn TrendingProvider,
    limit: usize,
    fetch_count: usize,
) -> Vec<TrendingItem> {
    let mut items = match provider.fetch_items(fetch_count).await {
        Ok(items) => items,
        Err(FetchError::MissingApiKey(name)) => {
            tracing::debug!(provider = name, "No API key configured, skipping provider");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                provider = provider.name(),
                category = %provider.category(),
                "Trending fetch failed"
            );
            return Vec::new();
        }
    };

    items.shuffle(&mut rand::rng());
    items.truncate(limit);

    tracing::info!(
        provider = provider.name(),
        category = %provider.category(),
        items = items.len(),
        "Trending items fetched"
    );

    items
}

/// Sends a GET request and decodes the JSON body
///
/// Non-success statuses and undecodable bodies are both reported as errors.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &'static str,
) -> FetchResult<T> {
    let response = request.send().await?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    let body = response.text().await?;
    tracing::debug!(provider, bytes = body.len(), "Raw upstream response received");

    serde_json::from_str(&body).map_err(|e| {
        tracing::debug!(provider, error = %e, "Failed to deserialize upstream response");
        FetchError::Decode(e)
    })
}

/// Returns the string unchanged when it has any non-whitespace content
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Description text, falling back to the shared placeholder
pub(crate) fn description_or_default(value: Option<&str>) -> String {
    non_blank(value)
        .unwrap_or(crate::models::DEFAULT_DESCRIPTION)
        .to_string()
}
