use redis::AsyncCommands;
use redis::Client;

use crate::{
    db::store::{CacheKey, CacheStore},
    error::CacheResult,
    models::CacheEnvelope,
};

/// Creates a Redis client for caching
///
/// Connections are multiplexed per call; the client itself only holds the URL.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Durable cache tier backed by Redis
///
/// Entries hold the full envelope as JSON and expire server-side after the TTL,
/// which keeps Redis tidy; freshness is still judged from `stored_at`.
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
    ttl_secs: u64,
}

impl RedisStore {
    pub fn new(redis_client: Client, ttl_secs: u64) -> Self {
        Self {
            redis_client,
            ttl_secs,
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEnvelope>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, envelope: &CacheEnvelope) -> CacheResult<()> {
        let json = serde_json::to_string(envelope)?;
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key.to_string(), json, self.ttl_secs).await?;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> CacheResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key.to_string()).await?;
        Ok(())
    }
}
