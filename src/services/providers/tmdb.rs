/// TMDb provider for trending movies
///
/// Uses the weekly `/trending/movie/week` endpoint. Requires an API key; when
/// none is configured the provider reports `MissingApiKey` without calling out.
use crate::{
    error::{FetchError, FetchResult},
    models::{
        upstream::{TmdbMovie, TmdbTrendingResponse},
        Category, Score, TrendingItem,
    },
    services::providers::{description_or_default, get_json, non_blank, TrendingProvider},
};
use reqwest::Client as HttpClient;

const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(http_client: HttpClient, api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
        }
    }

    fn normalize(movie: TmdbMovie) -> Option<TrendingItem> {
        let title = non_blank(movie.title.as_deref())?.to_string();
        let poster_path = non_blank(movie.poster_path.as_deref())?;

        Some(TrendingItem {
            title,
            image: format!("{}{}", POSTER_BASE_URL, poster_path),
            description: description_or_default(movie.overview.as_deref()),
            score: Score::from_rating(movie.vote_average),
            preview_url: None,
        })
    }

    fn normalize_all(response: TmdbTrendingResponse) -> Vec<TrendingItem> {
        response
            .results
            .into_iter()
            .filter_map(Self::normalize)
            .collect()
    }
}

#[async_trait::async_trait]
impl TrendingProvider for TmdbProvider {
    fn category(&self) -> Category {
        Category::Movies
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }

    /// TMDb returns a fixed page of 20; `fetch_count` is applied by truncation
    async fn fetch_items(&self, fetch_count: usize) -> FetchResult<Vec<TrendingItem>> {
        let api_key = non_blank(self.api_key.as_deref())
            .ok_or(FetchError::MissingApiKey(self.name()))?;

        let url = format!("{}/trending/movie/week", self.api_url);
        let request = self.http_client.get(&url).query(&[
            ("api_key", api_key),
            ("language", "en-US"),
            ("page", "1"),
        ]);

        let response: TmdbTrendingResponse = get_json(request, self.name()).await?;
        let mut items = Self::normalize_all(response);
        items.truncate(fetch_count);
        Ok(items)
    }
}
