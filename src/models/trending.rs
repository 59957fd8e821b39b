use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;

/// Placeholder used when an upstream item carries no description
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

/// Literal shown for items without a rating
pub const SCORE_NOT_AVAILABLE: &str = "N/A";

/// Content category shown on the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Anime,
    Movies,
    Books,
    Music,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Anime,
        Category::Movies,
        Category::Books,
        Category::Music,
    ];

    /// Key used in the cached aggregate and in API payloads
    pub fn key(&self) -> &'static str {
        match self {
            Category::Anime => "anime",
            Category::Movies => "movies",
            Category::Books => "books",
            Category::Music => "music",
        }
    }

    /// Human-readable section heading
    pub fn label(&self) -> &'static str {
        match self {
            Category::Anime => "Trending Anime",
            Category::Movies => "Top Movies This Week",
            Category::Books => "Popular Books",
            Category::Music => "Trending Music",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Rating of a trending item
///
/// Serialized as a bare number when rated and as the string `"N/A"` otherwise,
/// so "no rating" stays distinguishable from a rating of zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Rated(f64),
    NotAvailable,
}

impl Score {
    /// Rounds a raw upstream rating to one decimal place
    pub fn from_rating(rating: Option<f64>) -> Self {
        match rating {
            Some(value) if value.is_finite() => Score::Rated((value * 10.0).round() / 10.0),
            _ => Score::NotAvailable,
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Rated(value) => serializer.serialize_f64(*value),
            Score::NotAvailable => serializer.serialize_str(SCORE_NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawScore {
            Number(f64),
            Text(String),
        }

        match RawScore::deserialize(deserializer)? {
            RawScore::Number(value) => Ok(Score::Rated(value)),
            RawScore::Text(text) if text == SCORE_NOT_AVAILABLE => Ok(Score::NotAvailable),
            RawScore::Text(text) => Err(serde::de::Error::custom(format!(
                "invalid score literal: {}",
                text
            ))),
        }
    }
}

/// Normalized item produced by every content provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingItem {
    pub title: String,
    pub image: String,
    pub description: String,
    pub score: Score,
    /// Audio preview, only ever set for music
    #[serde(default)]
    pub preview_url: Option<String>,
}

/// Where an aggregate was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    File,
    Session,
    Api,
}

impl Display for CacheSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheSource::File => write!(f, "file"),
            CacheSource::Session => write!(f, "session"),
            CacheSource::Api => write!(f, "api"),
        }
    }
}

/// Combined trending results across all categories for one TTL window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingAggregate {
    #[serde(default)]
    pub anime: Vec<TrendingItem>,
    #[serde(default)]
    pub movies: Vec<TrendingItem>,
    #[serde(default)]
    pub books: Vec<TrendingItem>,
    #[serde(default)]
    pub music: Vec<TrendingItem>,
    pub generated_at: DateTime<Utc>,
    pub cache_source: CacheSource,
}

impl TrendingAggregate {
    /// Creates an aggregate with every category empty
    pub fn empty(generated_at: DateTime<Utc>, cache_source: CacheSource) -> Self {
        Self {
            anime: Vec::new(),
            movies: Vec::new(),
            books: Vec::new(),
            music: Vec::new(),
            generated_at,
            cache_source,
        }
    }

    pub fn items(&self, category: Category) -> &[TrendingItem] {
        match category {
            Category::Anime => &self.anime,
            Category::Movies => &self.movies,
            Category::Books => &self.books,
            Category::Music => &self.music,
        }
    }

    pub fn set_items(&mut self, category: Category, items: Vec<TrendingItem>) {
        match category {
            Category::Anime => self.anime = items,
            Category::Movies => self.movies = items,
            Category::Books => self.books = items,
            Category::Music => self.music = items,
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.items(*c).is_empty())
    }
}

/// A cached aggregate together with the moment it was stored
///
/// The file store derives `stored_at` from the file's modification time; the
/// session and Redis stores persist it alongside the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    pub data: TrendingAggregate,
    pub stored_at: DateTime<Utc>,
}

impl CacheEnvelope {
    pub fn new(data: TrendingAggregate, stored_at: DateTime<Utc>) -> Self {
        Self { data, stored_at }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.stored_at
    }

    /// An envelope is fresh while `now - stored_at < ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// One rendered home-page section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub category: Category,
    pub title: &'static str,
    pub items: Vec<TrendingItem>,
}
