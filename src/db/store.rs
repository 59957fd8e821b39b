use std::fmt::Display;

use crate::{error::CacheResult, models::CacheEnvelope};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Shared aggregate in the durable tier
    TrendingFull,
    /// Per-session aggregate in the ephemeral tier
    SessionTrending(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::TrendingFull => write!(f, "trending:full"),
            CacheKey::SessionTrending(session) => write!(f, "session:{}:trending", session),
        }
    }
}

impl CacheKey {
    /// File-system safe form of the key
    pub fn file_name(&self) -> String {
        format!("{}.json", self.to_string().replace(':', "_"))
    }
}

/// Whole-object storage for cached trending aggregates
///
/// Implementations never interpret the TTL on read; freshness is decided by the
/// cache manager from `CacheEnvelope::stored_at`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Store name for logging and status reports
    fn name(&self) -> &'static str;

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEnvelope>>;

    /// Replaces the entry for `key` as a whole
    async fn set(&self, key: &CacheKey, envelope: &CacheEnvelope) -> CacheResult<()>;

    /// Removes the entry; removing a missing entry succeeds
    async fn remove(&self, key: &CacheKey) -> CacheResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_trending_full() {
        assert_eq!(format!("{}", CacheKey::TrendingFull), "trending:full");
    }

    #[test]
    fn test_cache_key_display_session() {
        let key = CacheKey::SessionTrending("3f2a".to_string());
        assert_eq!(format!("{}", key), "session:3f2a:trending");
    }

    #[test]
    fn test_cache_key_file_name() {
        assert_eq!(CacheKey::TrendingFull.file_name(), "trending_full.json");
        assert_eq!(
            CacheKey::SessionTrending("abc".to_string()).file_name(),
            "session_abc_trending.json"
        );
    }
}
