/// Jikan (MyAnimeList) provider for trending anime
///
/// Uses the public `/top/anime` endpoint, which needs no API key.
use crate::{
    error::FetchResult,
    models::{
        upstream::{JikanAnime, JikanTopResponse},
        Category, Score, TrendingItem,
    },
    services::providers::{description_or_default, get_json, non_blank, TrendingProvider},
};
use reqwest::Client as HttpClient;

/// Jikan rejects `limit` values above 25
const MAX_PAGE_SIZE: usize = 25;

#[derive(Clone)]
pub struct JikanProvider {
    http_client: HttpClient,
    api_url: String,
}

impl JikanProvider {
    pub fn new(http_client: HttpClient, api_url: String) -> Self {
        Self {
            http_client,
            api_url,
        }
    }

    /// Maps one anime entry, dropping it when title or image is missing
    ///
    /// JPG is preferred over WEBP when both are present.
    fn normalize(anime: JikanAnime) -> Option<TrendingItem> {
        let title = non_blank(anime.title.as_deref())?.to_string();

        let images = anime.images.as_ref();
        let jpg = images
            .and_then(|i| i.jpg.as_ref())
            .and_then(|set| non_blank(set.image_url.as_deref()));
        let webp = images
            .and_then(|i| i.webp.as_ref())
            .and_then(|set| non_blank(set.image_url.as_deref()));
        let image = jpg.or(webp)?.to_string();

        Some(TrendingItem {
            title,
            image,
            description: description_or_default(anime.synopsis.as_deref()),
            score: Score::from_rating(anime.score),
            preview_url: None,
        })
    }

    fn normalize_all(response: JikanTopResponse) -> Vec<TrendingItem> {
        response
            .data
            .into_iter()
            .filter_map(Self::normalize)
            .collect()
    }
}

#[async_trait::async_trait]
impl TrendingProvider for JikanProvider {
    fn category(&self) -> Category {
        Category::Anime
    }

    fn name(&self) -> &'static str {
        "jikan"
    }

    async fn fetch_items(&self, fetch_count: usize) -> FetchResult<Vec<TrendingItem>> {
        let url = format!("{}/top/anime", self.api_url);
        let limit = fetch_count.clamp(1, MAX_PAGE_SIZE).to_string();

        let request = self
            .http_client
            .get(&url)
            .query(&[("limit", limit.as_str())]);

        let response: JikanTopResponse = get_json(request, self.name()).await?;
        Ok(Self::normalize_all(response))
    }
}
