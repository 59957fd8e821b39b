use std::sync::Arc;

use reqwest::Client as HttpClient;

use crate::{
    config::{CacheBackend, Config},
    db::{create_redis_client, CacheStore, FileStore, RedisStore, SessionStore},
    services::{
        providers::{
            GoogleBooksProvider, ItunesProvider, JikanProvider, TmdbProvider, TrendingProvider,
        },
        trending::{cache_ttl, CACHE_TTL_SECS},
        TrendingCache,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub trending: Arc<TrendingCache>,
}

impl AppState {
    pub fn new(trending: TrendingCache) -> Self {
        Self {
            trending: Arc::new(trending),
        }
    }

    /// Wires providers and cache stores from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let providers: Vec<Arc<dyn TrendingProvider>> = vec![
            Arc::new(JikanProvider::new(
                http_client.clone(),
                config.jikan_api_url.clone(),
            )),
            Arc::new(TmdbProvider::new(
                http_client.clone(),
                config.tmdb_api_key.clone(),
                config.tmdb_api_url.clone(),
            )),
            Arc::new(GoogleBooksProvider::new(
                http_client.clone(),
                config.google_books_api_key.clone(),
                config.google_books_api_url.clone(),
            )),
            Arc::new(ItunesProvider::new(
                http_client,
                config.itunes_api_url.clone(),
            )),
        ];

        let durable: Arc<dyn CacheStore> = match config.cache_backend {
            CacheBackend::File => {
                let store = FileStore::new(config.cache_dir.clone());
                tracing::debug!(dir = %store.dir().display(), "Using file-backed durable cache");
                Arc::new(store)
            }
            CacheBackend::Redis => Arc::new(RedisStore::new(
                create_redis_client(&config.redis_url)?,
                CACHE_TTL_SECS as u64,
            )),
        };
        let ephemeral: Arc<dyn CacheStore> = Arc::new(SessionStore::new(cache_ttl()));

        tracing::info!(
            durable = durable.name(),
            providers = providers.len(),
            fetch_count = config.fetch_count,
            "Trending cache configured"
        );

        Ok(Self::new(TrendingCache::new(
            providers,
            durable,
            ephemeral,
            config.fetch_count,
        )))
    }
}
