use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};

use crate::{
    db::{CacheKey, CacheStore},
    error::CacheResult,
    middleware::SessionId,
    models::{CacheEnvelope, CacheSource, Category, TrendingAggregate},
    services::providers::{fetch_trending, TrendingProvider},
};

/// Validity window shared by both cache tiers (6 hours)
pub const CACHE_TTL_SECS: i64 = 6 * 60 * 60;

/// Candidates requested from each provider per refresh
pub const DEFAULT_FETCH_COUNT: usize = 16;

pub fn cache_ttl() -> Duration {
    Duration::seconds(CACHE_TTL_SECS)
}

/// Snapshot of one cache tier for the status endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TierStatus {
    pub store: &'static str,
    pub present: bool,
    pub stored_at: Option<DateTime<Utc>>,
    pub age_seconds: Option<i64>,
    pub fresh: bool,
    pub item_counts: Option<BTreeMap<&'static str, usize>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStatus {
    pub ttl_seconds: i64,
    pub durable: TierStatus,
    pub session: TierStatus,
}

/// Refresh shared by every caller that missed while it was running
type InFlightRefresh = Arc<OnceCell<(TrendingAggregate, CacheSource)>>;

/// Produces the trending aggregate, preferring cached copies
///
/// Lookup order is durable tier, then the caller's session tier, then a live
/// refresh across every provider. A refresh is written to the durable tier
/// once; a failed durable write is logged and otherwise ignored. Every caller
/// that receives a fresh aggregate writes it to its own session. The manager
/// holds no aggregate itself, only its two stores and the refresh in flight.
pub struct TrendingCache {
    providers: Vec<Arc<dyn TrendingProvider>>,
    durable: Arc<dyn CacheStore>,
    ephemeral: Arc<dyn CacheStore>,
    fetch_count: usize,
    ttl: Duration,
    in_flight: Mutex<Option<InFlightRefresh>>,
}

impl TrendingCache {
    pub fn new(
        providers: Vec<Arc<dyn TrendingProvider>>,
        durable: Arc<dyn CacheStore>,
        ephemeral: Arc<dyn CacheStore>,
        fetch_count: usize,
    ) -> Self {
        Self {
            providers,
            durable,
            ephemeral,
            fetch_count,
            ttl: cache_ttl(),
            in_flight: Mutex::new(None),
        }
    }

    fn session_key(session: &SessionId) -> CacheKey {
        CacheKey::SessionTrending(session.to_string())
    }

    /// Returns the aggregate for this request and where it came from
    ///
    /// Concurrent misses, from any session, join one refresh instead of
    /// queueing behind each other.
    pub async fn get_aggregate(&self, session: &SessionId) -> (TrendingAggregate, CacheSource) {
        let session_key = Self::session_key(session);

        if let Some(hit) = self.lookup(&session_key).await {
            return hit;
        }

        let refresh = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(in_flight.get_or_insert_with(|| Arc::new(OnceCell::new())))
        };
        let (aggregate, source) = refresh.get_or_init(|| self.shared_refresh()).await.clone();

        // The first caller past a finished refresh retires it
        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &refresh))
            {
                *in_flight = None;
            }
        }

        if source == CacheSource::Api {
            self.store_session(&session_key, &aggregate).await;
        }

        tracing::info!(
            session = %session,
            provenance = %source,
            empty = aggregate.is_empty(),
            "Trending aggregate resolved after cache miss"
        );

        (aggregate, source)
    }

    async fn lookup(&self, session_key: &CacheKey) -> Option<(TrendingAggregate, CacheSource)> {
        if let Some(aggregate) = self
            .read_fresh(self.durable.as_ref(), &CacheKey::TrendingFull)
            .await
        {
            tracing::debug!(provenance = %CacheSource::File, "Trending cache hit");
            return Some((aggregate, CacheSource::File));
        }

        if let Some(aggregate) = self.read_fresh(self.ephemeral.as_ref(), session_key).await {
            tracing::debug!(provenance = %CacheSource::Session, "Trending cache hit");
            return Some((aggregate, CacheSource::Session));
        }

        None
    }

    /// Reads a tier, treating expired entries and store errors as misses
    async fn read_fresh(&self, store: &dyn CacheStore, key: &CacheKey) -> Option<TrendingAggregate> {
        match store.get(key).await {
            Ok(Some(envelope)) if envelope.is_fresh(Utc::now(), self.ttl) => Some(envelope.data),
            Ok(Some(envelope)) => {
                tracing::debug!(
                    store = store.name(),
                    key = %key,
                    stored_at = %envelope.stored_at,
                    "Cached aggregate expired"
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    store = store.name(),
                    key = %key,
                    "Cache read failed, treating as miss"
                );
                None
            }
        }
    }

    /// Body of the shared refresh
    ///
    /// Re-checks the durable tier first, since a refresh that finished just
    /// before this one started may already have written it.
    async fn shared_refresh(&self) -> (TrendingAggregate, CacheSource) {
        if let Some(aggregate) = self
            .read_fresh(self.durable.as_ref(), &CacheKey::TrendingFull)
            .await
        {
            return (aggregate, CacheSource::File);
        }

        let aggregate = self.refresh().await;
        self.store_durable(&aggregate).await;

        tracing::info!(
            provenance = %CacheSource::Api,
            empty = aggregate.is_empty(),
            "Trending aggregate refreshed"
        );

        (aggregate, CacheSource::Api)
    }

    /// Fetches every category concurrently and assembles a fresh aggregate
    ///
    /// Each provider keeps its full fetched set; the per-page cut happens at
    /// selection time.
    pub async fn refresh(&self) -> TrendingAggregate {
        let mut aggregate = TrendingAggregate::empty(Utc::now(), CacheSource::Api);

        let mut tasks = Vec::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let fetch_count = self.fetch_count;
            let category = provider.category();
            let task = tokio::spawn(async move {
                fetch_trending(provider.as_ref(), fetch_count, fetch_count).await
            });
            tasks.push((category, task));
        }

        for (category, task) in tasks {
            match task.await {
                Ok(items) => aggregate.set_items(category, items),
                Err(e) => {
                    tracing::error!(error = %e, category = %category, "Provider task join error");
                }
            }
        }

        aggregate
    }

    async fn store_durable(&self, aggregate: &TrendingAggregate) {
        let envelope = CacheEnvelope::new(aggregate.clone(), Utc::now());
        if let Err(e) = self.durable.set(&CacheKey::TrendingFull, &envelope).await {
            tracing::warn!(
                error = %e,
                store = self.durable.name(),
                "Durable cache write failed, falling back to session cache"
            );
        }
    }

    async fn store_session(&self, session_key: &CacheKey, aggregate: &TrendingAggregate) {
        let envelope = CacheEnvelope::new(aggregate.clone(), Utc::now());
        if let Err(e) = self.ephemeral.set(session_key, &envelope).await {
            tracing::warn!(
                error = %e,
                store = self.ephemeral.name(),
                "Session cache write failed"
            );
        }
    }

    /// Reports the state of both tiers for this session
    pub async fn status(&self, session: &SessionId) -> CacheStatus {
        let now = Utc::now();
        CacheStatus {
            ttl_seconds: self.ttl.num_seconds(),
            durable: self
                .tier_status(self.durable.as_ref(), &CacheKey::TrendingFull, now)
                .await,
            session: self
                .tier_status(self.ephemeral.as_ref(), &Self::session_key(session), now)
                .await,
        }
    }

    async fn tier_status(
        &self,
        store: &dyn CacheStore,
        key: &CacheKey,
        now: DateTime<Utc>,
    ) -> TierStatus {
        let mut status = TierStatus {
            store: store.name(),
            present: false,
            stored_at: None,
            age_seconds: None,
            fresh: false,
            item_counts: None,
            error: None,
        };

        match store.get(key).await {
            Ok(Some(envelope)) => {
                status.present = true;
                status.stored_at = Some(envelope.stored_at);
                status.age_seconds = Some(envelope.age(now).num_seconds());
                status.fresh = envelope.is_fresh(now, self.ttl);
                status.item_counts = Some(
                    Category::ALL
                        .iter()
                        .map(|c| (c.key(), envelope.data.items(*c).len()))
                        .collect(),
                );
            }
            Ok(None) => {}
            Err(e) => status.error = Some(e.to_string()),
        }

        status
    }

    /// Drops the shared durable aggregate
    pub async fn clear_durable(&self) -> CacheResult<()> {
        self.durable.remove(&CacheKey::TrendingFull).await?;
        tracing::info!(store = self.durable.name(), "Durable trending cache cleared");
        Ok(())
    }

    /// Drops this session's aggregate
    pub async fn clear_session(&self, session: &SessionId) -> CacheResult<()> {
        self.ephemeral.remove(&Self::session_key(session)).await?;
        tracing::info!(session = %session, "Session trending cache cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockCacheStore;
    use crate::db::{FileStore, SessionStore};
    use crate::error::CacheError;
    use crate::models::{Score, TrendingItem};
    use crate::services::providers::MockTrendingProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn items(category: Category, count: usize) -> Vec<TrendingItem> {
        (0..count)
            .map(|n| TrendingItem {
                title: format!("{} {}", category, n),
                image: format!("https://img/{}/{}.jpg", category, n),
                description: "synthetic".to_string(),
                score: Score::Rated(7.5),
                preview_url: None,
            })
            .collect()
    }

    /// One provider per category, all sharing a call counter
    fn providers(calls: &Arc<AtomicUsize>) -> Vec<Arc<dyn TrendingProvider>> {
        Category::ALL
            .iter()
            .map(|category| {
                let category = *category;
                let calls = Arc::clone(calls);
                let mut provider = MockTrendingProvider::new();
                provider.expect_category().return_const(category);
                provider.expect_name().return_const("mock");
                provider.expect_fetch_items().returning(move |count| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(items(category, count))
                });
                Arc::new(provider) as Arc<dyn TrendingProvider>
            })
            .collect()
    }

    fn session_store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(cache_ttl()))
    }

    fn unwritable_durable() -> MockCacheStore {
        let mut durable = MockCacheStore::new();
        durable.expect_name().return_const("file");
        durable.expect_get().returning(|_| Ok(None));
        durable.expect_set().returning(|_, _| {
            Err(CacheError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only deployment",
            )))
        });
        durable
    }

    #[tokio::test]
    async fn test_refresh_fills_every_category_with_full_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dir = tempfile::tempdir().unwrap();
        let cache = TrendingCache::new(
            providers(&calls),
            Arc::new(FileStore::new(dir.path())),
            session_store(),
            DEFAULT_FETCH_COUNT,
        );

        let aggregate = cache.refresh().await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        for category in Category::ALL {
            assert_eq!(aggregate.items(category).len(), 16);
        }
        assert_eq!(aggregate.cache_source, CacheSource::Api);
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_durable_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dir = tempfile::tempdir().unwrap();
        let cache = TrendingCache::new(
            providers(&calls),
            Arc::new(FileStore::new(dir.path())),
            session_store(),
            DEFAULT_FETCH_COUNT,
        );
        let session = SessionId::new();

        let (first, first_source) = cache.get_aggregate(&session).await;
        let (second, second_source) = cache.get_aggregate(&session).await;

        assert_eq!(first_source, CacheSource::Api);
        assert_eq!(second_source, CacheSource::File);
        assert_eq!(first.generated_at, second.generated_at);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_durable_write_failure_falls_back_to_session() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = TrendingCache::new(
            providers(&calls),
            Arc::new(unwritable_durable()),
            session_store(),
            DEFAULT_FETCH_COUNT,
        );
        let session = SessionId::new();

        let (fresh, source) = cache.get_aggregate(&session).await;
        assert_eq!(source, CacheSource::Api);
        assert!(!fresh.is_empty());

        let (cached, source) = cache.get_aggregate(&session).await;
        assert_eq!(source, CacheSource::Session);
        assert_eq!(cached, fresh);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_session_tier_does_not_cover_other_sessions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = TrendingCache::new(
            providers(&calls),
            Arc::new(unwritable_durable()),
            session_store(),
            DEFAULT_FETCH_COUNT,
        );

        cache.get_aggregate(&SessionId::new()).await;
        let (_, source) = cache.get_aggregate(&SessionId::new()).await;

        assert_eq!(source, CacheSource::Api);
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_durable_read_error_is_a_miss() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut durable = MockCacheStore::new();
        durable.expect_name().return_const("file");
        durable.expect_get().returning(|_| {
            Err(CacheError::Io(std::io::Error::other("disk on fire")))
        });
        durable.expect_set().returning(|_, _| Ok(()));

        let cache = TrendingCache::new(
            providers(&calls),
            Arc::new(durable),
            session_store(),
            DEFAULT_FETCH_COUNT,
        );

        let (_, source) = cache.get_aggregate(&SessionId::new()).await;
        assert_eq!(source, CacheSource::Api);
    }

    async fn seeded_cache(age: Duration) -> (TrendingCache, Arc<AtomicUsize>, SessionId) {
        let calls = Arc::new(AtomicUsize::new(0));
        let session = SessionId::new();
        let ephemeral = session_store();

        let mut stale = TrendingAggregate::empty(Utc::now() - age, CacheSource::Api);
        stale.set_items(Category::Anime, items(Category::Anime, 2));
        ephemeral
            .set(
                &CacheKey::SessionTrending(session.to_string()),
                &CacheEnvelope::new(stale, Utc::now() - age),
            )
            .await
            .unwrap();

        let cache = TrendingCache::new(
            providers(&calls),
            Arc::new(unwritable_durable()),
            ephemeral,
            DEFAULT_FETCH_COUNT,
        );
        (cache, calls, session)
    }

    #[tokio::test]
    async fn test_ttl_boundary_expired_triggers_refresh() {
        let (cache, calls, session) = seeded_cache(cache_ttl() + Duration::seconds(1)).await;

        let (_, source) = cache.get_aggregate(&session).await;

        assert_eq!(source, CacheSource::Api);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_ttl_boundary_valid_is_served() {
        let (cache, calls, session) = seeded_cache(cache_ttl() - Duration::seconds(1)).await;

        let (aggregate, source) = cache.get_aggregate(&session).await;

        assert_eq!(source, CacheSource::Session);
        assert_eq!(aggregate.items(Category::Anime).len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_durable_file_triggers_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dir = tempfile::tempdir().unwrap();
        let durable = FileStore::new(dir.path());

        let old = TrendingAggregate::empty(Utc::now(), CacheSource::Api);
        durable
            .set(&CacheKey::TrendingFull, &CacheEnvelope::new(old, Utc::now()))
            .await
            .unwrap();
        let expired_at = std::time::SystemTime::now()
            - std::time::Duration::from_secs(CACHE_TTL_SECS as u64 + 1);
        std::fs::File::options()
            .write(true)
            .open(durable.path(&CacheKey::TrendingFull))
            .unwrap()
            .set_modified(expired_at)
            .unwrap();

        let cache = TrendingCache::new(
            providers(&calls),
            Arc::new(durable),
            session_store(),
            DEFAULT_FETCH_COUNT,
        );

        let (aggregate, source) = cache.get_aggregate(&SessionId::new()).await;
        assert_eq!(source, CacheSource::Api);
        assert_eq!(aggregate.items(Category::Books).len(), 16);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failed_providers_yield_empty_aggregate() {
        let failing: Vec<Arc<dyn TrendingProvider>> = Category::ALL
            .iter()
            .map(|category| {
                let mut provider = MockTrendingProvider::new();
                provider.expect_category().return_const(*category);
                provider.expect_name().return_const("mock");
                provider.expect_fetch_items().returning(|_| {
                    Err(crate::error::FetchError::Status(
                        reqwest::StatusCode::BAD_GATEWAY,
                    ))
                });
                Arc::new(provider) as Arc<dyn TrendingProvider>
            })
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let cache = TrendingCache::new(
            failing,
            Arc::new(FileStore::new(dir.path())),
            session_store(),
            DEFAULT_FETCH_COUNT,
        );

        let (aggregate, source) = cache.get_aggregate(&SessionId::new()).await;
        assert_eq!(source, CacheSource::Api);
        assert!(aggregate.is_empty());
    }

    #[tokio::test]
    async fn test_status_and_clear() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dir = tempfile::tempdir().unwrap();
        let cache = TrendingCache::new(
            providers(&calls),
            Arc::new(FileStore::new(dir.path())),
            session_store(),
            DEFAULT_FETCH_COUNT,
        );
        let session = SessionId::new();

        let empty = cache.status(&session).await;
        assert!(!empty.durable.present);
        assert!(!empty.session.present);
        assert_eq!(empty.ttl_seconds, 21600);

        cache.get_aggregate(&session).await;
        let warm = cache.status(&session).await;
        assert!(warm.durable.present && warm.durable.fresh);
        assert!(warm.session.present && warm.session.fresh);
        assert_eq!(warm.durable.item_counts.unwrap()["music"], 16);

        cache.clear_durable().await.unwrap();
        cache.clear_session(&session).await.unwrap();
        let cleared = cache.status(&session).await;
        assert!(!cleared.durable.present);
        assert!(!cleared.session.present);
    }

    /// Provider that takes a fixed time to answer
    struct SlowProvider {
        category: Category,
        delay: std::time::Duration,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl TrendingProvider for SlowProvider {
        fn category(&self) -> Category {
            self.category
        }

        fn name(&self) -> &'static str {
            "slow"
        }

        async fn fetch_items(
            &self,
            fetch_count: usize,
        ) -> crate::error::FetchResult<Vec<TrendingItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(items(self.category, fetch_count))
        }
    }

    fn slow_providers(
        calls: &Arc<AtomicUsize>,
        delay: std::time::Duration,
    ) -> Vec<Arc<dyn TrendingProvider>> {
        Category::ALL
            .iter()
            .map(|category| {
                Arc::new(SlowProvider {
                    category: *category,
                    delay,
                    calls: Arc::clone(calls),
                }) as Arc<dyn TrendingProvider>
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_share_one_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(TrendingCache::new(
            slow_providers(&calls, std::time::Duration::from_millis(200)),
            Arc::new(FileStore::new(dir.path())),
            session_store(),
            DEFAULT_FETCH_COUNT,
        ));

        let first = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.get_aggregate(&SessionId::new()).await }
        });
        let second = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.get_aggregate(&SessionId::new()).await }
        });

        let (first, _) = first.await.unwrap();
        let (second, _) = second.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(first.generated_at, second.generated_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_new_sessions_do_not_queue_when_durable_is_unwritable() {
        let delay = std::time::Duration::from_millis(300);
        let calls = Arc::new(AtomicUsize::new(0));
        let ephemeral = session_store();
        let cache = Arc::new(TrendingCache::new(
            slow_providers(&calls, delay),
            Arc::new(unwritable_durable()),
            ephemeral.clone(),
            DEFAULT_FETCH_COUNT,
        ));

        let sessions: Vec<SessionId> = (0..5).map(|_| SessionId::new()).collect();
        let started = std::time::Instant::now();
        let handles: Vec<_> = sessions
            .iter()
            .map(|session| {
                let cache = Arc::clone(&cache);
                let session = *session;
                tokio::spawn(async move { cache.get_aggregate(&session).await })
            })
            .collect();
        for handle in handles {
            let (aggregate, source) = handle.await.unwrap();
            assert_eq!(source, CacheSource::Api);
            assert!(!aggregate.is_empty());
        }
        let elapsed = started.elapsed();

        // One refresh worth of latency, not one per session
        assert!(elapsed < delay * 3, "refreshes ran back to back: {:?}", elapsed);
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        // Each joined session still got its own session copy
        assert_eq!(ephemeral.len().await, 5);
        for session in &sessions {
            let (_, source) = cache.get_aggregate(session).await;
            assert_eq!(source, CacheSource::Session);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
