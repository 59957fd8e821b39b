use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use crate::{
    db::store::{CacheKey, CacheStore},
    error::CacheResult,
    models::CacheEnvelope,
};

/// Entries kept before the oldest session is evicted
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Ephemeral cache tier scoped to user sessions
///
/// Lives in process memory, so its contents vanish on restart just as a
/// session would. Every write prunes envelopes older than the TTL, and the
/// map never holds more than `max_entries` sessions: cookieless clients get a
/// new session per request, so the oldest envelope makes room for a new one.
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEnvelope>>>,
    ttl: Duration,
    max_entries: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_max_entries(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Number of live entries, including ones not yet pruned
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheStore for SessionStore {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEnvelope>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &CacheKey, envelope: &CacheEnvelope) -> CacheResult<()> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;

        let before = entries.len();
        entries.retain(|_, existing| existing.is_fresh(now, self.ttl));
        let pruned = before - entries.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned expired session cache entries");
        }

        if !entries.contains_key(key) {
            while entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, existing)| existing.stored_at)
                    .map(|(oldest, _)| oldest.clone());
                match oldest {
                    Some(oldest) => {
                        entries.remove(&oldest);
                        tracing::debug!(evicted = %oldest, "Session cache full, evicted oldest entry");
                    }
                    None => break,
                }
            }
        }

        entries.insert(key.clone(), envelope.clone());
        tracing::debug!(entries = entries.len(), "Session cache entry stored");
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> CacheResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
