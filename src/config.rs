use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Which backend holds the durable (cross-session) trending cache
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    File,
    Redis,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDb API key; without it the movie category stays empty
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// Google Books API key; without it the books category stays empty
    #[serde(default)]
    pub google_books_api_key: Option<String>,

    #[serde(default = "default_jikan_api_url")]
    pub jikan_api_url: String,

    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    #[serde(default = "default_itunes_api_url")]
    pub itunes_api_url: String,

    #[serde(default = "default_google_books_api_url")]
    pub google_books_api_url: String,

    /// Durable cache backend
    #[serde(default)]
    pub cache_backend: CacheBackend,

    /// Directory for the file-backed durable cache
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Redis connection URL, used when `cache_backend` is `redis`
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Candidates requested from each upstream catalog per refresh
    #[serde(default = "default_fetch_count")]
    pub fetch_count: usize,

    /// Per-request timeout for upstream catalog calls
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_jikan_api_url() -> String {
    "https://api.jikan.moe/v4".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_itunes_api_url() -> String {
    "https://itunes.apple.com".to_string()
}

fn default_google_books_api_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_fetch_count() -> usize {
    16
}

fn default_http_timeout_secs() -> u64 {
    5
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
