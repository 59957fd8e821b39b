/// iTunes top-songs provider for trending music
///
/// Reads the public RSS feed rendered as JSON. The feed carries no ratings, so
/// every song is scored "N/A"; it is the only provider that sets `preview_url`.
use crate::{
    error::FetchResult,
    models::{
        upstream::{ItunesEntry, ItunesFeedResponse, ItunesLink},
        Category, Score, TrendingItem,
    },
    services::providers::{get_json, non_blank, TrendingProvider},
};
use reqwest::Client as HttpClient;

const UNKNOWN_SONG: &str = "Unknown Song";
const UNKNOWN_ARTIST: &str = "Unknown Artist";
const DEFAULT_IMAGE: &str = "default/item_default.png";

/// The RSS generator caps the feed at 200 entries
const MAX_FEED_SIZE: usize = 200;

#[derive(Clone)]
pub struct ItunesProvider {
    http_client: HttpClient,
    api_url: String,
}

impl ItunesProvider {
    pub fn new(http_client: HttpClient, api_url: String) -> Self {
        Self {
            http_client,
            api_url,
        }
    }

    /// First link that is an enclosure or has an `audio/*` MIME type
    fn preview_url(links: &[ItunesLink]) -> Option<String> {
        links
            .iter()
            .filter_map(|link| link.attributes.as_ref())
            .find(|attrs| {
                attrs.rel.as_deref() == Some("enclosure")
                    || attrs
                        .mime_type
                        .as_deref()
                        .is_some_and(|t| t.starts_with("audio/"))
            })
            .and_then(|attrs| attrs.href.clone())
    }

    /// Songs are never dropped; missing fields fall back to placeholders
    fn normalize(entry: ItunesEntry) -> TrendingItem {
        let title = entry
            .name
            .as_ref()
            .and_then(|n| non_blank(n.label.as_deref()))
            .unwrap_or(UNKNOWN_SONG)
            .to_string();

        let artist = entry
            .artist
            .as_ref()
            .and_then(|a| non_blank(a.label.as_deref()))
            .unwrap_or(UNKNOWN_ARTIST)
            .to_string();

        // Images are listed smallest to largest
        let image = entry
            .images
            .last()
            .and_then(|img| non_blank(img.label.as_deref()))
            .unwrap_or(DEFAULT_IMAGE)
            .to_string();

        let links = entry.link.map(|l| l.into_vec()).unwrap_or_default();

        TrendingItem {
            title,
            image,
            description: artist,
            score: Score::NotAvailable,
            preview_url: Self::preview_url(&links),
        }
    }

    fn normalize_all(response: ItunesFeedResponse) -> Vec<TrendingItem> {
        response
            .feed
            .entry
            .into_vec()
            .into_iter()
            .map(Self::normalize)
            .collect()
    }
}

#[async_trait::async_trait]
impl TrendingProvider for ItunesProvider {
    fn category(&self) -> Category {
        Category::Music
    }

    fn name(&self) -> &'static str {
        "itunes"
    }

    async fn fetch_items(&self, fetch_count: usize) -> FetchResult<Vec<TrendingItem>> {
        let url = format!(
            "{}/us/rss/topsongs/limit={}/json",
            self.api_url,
            fetch_count.clamp(1, MAX_FEED_SIZE)
        );

        let response: ItunesFeedResponse = get_json(self.http_client.get(&url), self.name()).await?;
        Ok(Self::normalize_all(response))
    }
}
