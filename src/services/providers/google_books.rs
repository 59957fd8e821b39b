/// Google Books provider for popular books
///
/// Google Books has no trending endpoint, so each fetch picks a random genre
/// and asks for the most relevant volumes in that subject.
use crate::{
    error::{FetchError, FetchResult},
    models::{
        upstream::{GoogleBooksResponse, GoogleBooksVolume},
        Category, Score, TrendingItem,
    },
    services::providers::{description_or_default, get_json, non_blank, TrendingProvider},
};
use rand::seq::IndexedRandom;
use reqwest::Client as HttpClient;

pub const GENRES: [&str; 7] = [
    "fiction",
    "fantasy",
    "romance",
    "thriller",
    "science fiction",
    "mystery",
    "young adult",
];

/// Upstream maximum for `maxResults`
const MAX_RESULTS: usize = 40;

#[derive(Clone)]
pub struct GoogleBooksProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl GoogleBooksProvider {
    pub fn new(http_client: HttpClient, api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
        }
    }

    fn random_genre() -> &'static str {
        GENRES.choose(&mut rand::rng()).copied().unwrap_or(GENRES[0])
    }

    /// Volumes without a title or thumbnail are dropped
    fn normalize(volume: GoogleBooksVolume) -> Option<TrendingItem> {
        let info = volume.volume_info?;
        let title = non_blank(info.title.as_deref())?.to_string();
        let image = info
            .image_links
            .as_ref()
            .and_then(|links| non_blank(links.thumbnail.as_deref()))?
            .to_string();

        Some(TrendingItem {
            title,
            image,
            description: description_or_default(info.description.as_deref()),
            score: Score::from_rating(info.average_rating),
            preview_url: None,
        })
    }

    fn normalize_all(response: GoogleBooksResponse) -> Vec<TrendingItem> {
        response
            .items
            .into_iter()
            .filter_map(Self::normalize)
            .collect()
    }
}

#[async_trait::async_trait]
impl TrendingProvider for GoogleBooksProvider {
    fn category(&self) -> Category {
        Category::Books
    }

    fn name(&self) -> &'static str {
        "google_books"
    }

    async fn fetch_items(&self, fetch_count: usize) -> FetchResult<Vec<TrendingItem>> {
        let api_key = non_blank(self.api_key.as_deref())
            .ok_or(FetchError::MissingApiKey(self.name()))?;

        let genre = Self::random_genre();
        let query = format!("subject:{}", genre);
        let max_results = fetch_count.clamp(1, MAX_RESULTS).to_string();

        tracing::debug!(genre, "Fetching books for random genre");

        let url = format!("{}/volumes", self.api_url);
        let request = self.http_client.get(&url).query(&[
            ("q", query.as_str()),
            ("orderBy", "relevance"),
            ("maxResults", max_results.as_str()),
            ("key", api_key),
        ]);

        let response: GoogleBooksResponse = get_json(request, self.name()).await?;
        Ok(Self::normalize_all(response))
    }
}
