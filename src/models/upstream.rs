//! Raw payload shapes of the upstream catalog APIs.
//!
//! Every field a provider reads is optional here; providers decide what is
//! required when mapping into `TrendingItem`.

use serde::Deserialize;

// ============================================================================
// Jikan (MyAnimeList) API Types
// ============================================================================

/// Response from GET /top/anime
#[derive(Debug, Clone, Deserialize)]
pub struct JikanTopResponse {
    pub data: Vec<JikanAnime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanAnime {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub images: Option<JikanImages>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanImages {
    #[serde(default)]
    pub jpg: Option<JikanImageSet>,
    #[serde(default)]
    pub webp: Option<JikanImageSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
}

// ============================================================================
// TMDb API Types
// ============================================================================

/// Response from GET /trending/movie/week
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTrendingResponse {
    pub results: Vec<TmdbMovie>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

// ============================================================================
// Google Books API Types
// ============================================================================

/// Response from GET /volumes
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleBooksResponse {
    /// Absent when the query matched nothing
    #[serde(default)]
    pub items: Vec<GoogleBooksVolume>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleBooksVolume {
    #[serde(default)]
    pub volume_info: Option<GoogleBooksVolumeInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleBooksVolumeInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub image_links: Option<GoogleBooksImageLinks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleBooksImageLinks {
    #[serde(default)]
    pub thumbnail: Option<String>,
}

// ============================================================================
// iTunes RSS API Types
// ============================================================================

/// The RSS-to-JSON feed collapses single-element lists into bare objects
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Response from GET /us/rss/topsongs/limit={n}/json
#[derive(Debug, Clone, Deserialize)]
pub struct ItunesFeedResponse {
    pub feed: ItunesFeed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItunesFeed {
    pub entry: OneOrMany<ItunesEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItunesEntry {
    #[serde(rename = "im:name", default)]
    pub name: Option<ItunesLabel>,
    #[serde(rename = "im:artist", default)]
    pub artist: Option<ItunesLabel>,
    /// Ordered smallest to largest
    #[serde(rename = "im:image", default)]
    pub images: Vec<ItunesLabel>,
    #[serde(default)]
    pub link: Option<OneOrMany<ItunesLink>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItunesLabel {
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItunesLink {
    #[serde(default)]
    pub attributes: Option<ItunesLinkAttributes>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItunesLinkAttributes {
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(rename = "type", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}
