//! Single-slot bearer token cache.
//!
//! Responsibilities:
//! - Hand out the cached token while it is fresh (before `expires_at - margin`).
//! - Refresh through a [`TokenFetcher`] when stale, one fetch at a time.
//! - Evict the token when the lead API rejects it.
use leadrelay_types::{CachedToken, Clock, TokenFetcher, traits::Result};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub struct TokenCache {
    fetcher: Arc<dyn TokenFetcher>,
    clock: Arc<dyn Clock>,
    refresh_margin: u64,
    slot: RwLock<Option<CachedToken>>,
    // Held for the whole check-fetch-store sequence so concurrent stale hits
    // share a single fetch.
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new(fetcher: Arc<dyn TokenFetcher>, clock: Arc<dyn Clock>, refresh_margin: u64) -> Self {
        Self {
            fetcher,
            clock,
            refresh_margin,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Return a usable bearer token, fetching a new one if the cached token is
    /// missing or inside the refresh margin.
    ///
    /// # Errors
    ///
    /// Propagates the fetcher's error; the cache is left untouched in that case.
    pub async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;
        // Whoever held the lock before us may already have refreshed.
        if let Some(token) = self.fresh_token().await {
            tracing::debug!("bearer token refreshed by a concurrent request");
            return Ok(token);
        }

        let now = self.clock.now_secs();
        let cached = self.fetcher.fetch().await?.into_cached(now);
        let token = cached.access_token.clone();
        tracing::info!(expires_at = cached.expires_at, "bearer token refreshed");
        *self.slot.write().await = Some(cached);
        Ok(token)
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    /// Drop the cached token only if it is still `token`.
    ///
    /// Returns `true` if the slot was cleared. A request that was rejected
    /// with an old token must not evict a newer one stored in the meantime.
    pub async fn reject(&self, token: &str) -> bool {
        let mut slot = self.slot.write().await;
        if slot.as_ref().is_some_and(|t| t.access_token == token) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// Expiry of the cached token in seconds since the epoch, if one is held.
    pub async fn cached_expiry(&self) -> Option<u64> {
        self.slot.read().await.as_ref().map(|t| t.expires_at)
    }

    async fn fresh_token(&self) -> Option<String> {
        let now = self.clock.now_secs();
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|t| t.is_fresh(now, self.refresh_margin))
            .map(|t| t.access_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use leadrelay_types::{FetchedToken, ManualClock, RelayError};
    use std::{
        collections::VecDeque,
        sync::{
            Mutex as StdMutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    const MARGIN: u64 = 300;
    const T0: u64 = 1_700_000_000;

    /// Hands out scripted results in order and counts calls.
    #[derive(Default)]
    struct ScriptedFetcher {
        results: StdMutex<VecDeque<Result<FetchedToken>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedFetcher {
        fn new(results: impl IntoIterator<Item = Result<FetchedToken>>) -> Arc<Self> {
            Arc::new(Self {
                results: StdMutex::new(results.into_iter().collect()),
                ..Self::default()
            })
        }

        fn slow(results: impl IntoIterator<Item = Result<FetchedToken>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                results: StdMutex::new(results.into_iter().collect()),
                delay: Some(delay),
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenFetcher for ScriptedFetcher {
        async fn fetch(&self) -> Result<FetchedToken> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RelayError::UpstreamAuth("script exhausted".into())))
        }
    }

    fn ok(token: &str, ttl: u64) -> Result<FetchedToken> {
        Ok(FetchedToken::new(token, ttl))
    }

    fn make_cache(fetcher: Arc<ScriptedFetcher>, clock: &ManualClock) -> TokenCache {
        TokenCache::new(fetcher, Arc::new(clock.clone()), MARGIN)
    }

    #[tokio::test]
    async fn test_first_call_fetches_and_caches() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::new([ok("T1", 3600)]);
        let cache = make_cache(fetcher.clone(), &clock);

        assert_eq!(cache.get_token().await.unwrap(), "T1");
        assert_eq!(cache.get_token().await.unwrap(), "T1");
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.cached_expiry().await, Some(T0 + 3600));
    }

    #[tokio::test]
    async fn test_reuses_token_until_just_before_margin() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::new([ok("T1", 3600), ok("T2", 3600)]);
        let cache = make_cache(fetcher.clone(), &clock);
        cache.get_token().await.unwrap();

        clock.set(T0 + 3600 - MARGIN - 1);
        assert_eq!(cache.get_token().await.unwrap(), "T1");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_refreshes_inside_margin() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::new([ok("T1", 3600), ok("T2", 3600)]);
        let cache = make_cache(fetcher.clone(), &clock);
        cache.get_token().await.unwrap();

        clock.set(T0 + 3600 - MARGIN + 1);
        assert_eq!(cache.get_token().await.unwrap(), "T2");
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.cached_expiry().await, Some(T0 + 3600 - MARGIN + 1 + 3600));
    }

    #[tokio::test]
    async fn test_refreshes_exactly_at_margin() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::new([ok("T1", 3600), ok("T2", 3600)]);
        let cache = make_cache(fetcher.clone(), &clock);
        cache.get_token().await.unwrap();

        clock.set(T0 + 3600 - MARGIN);
        assert_eq!(cache.get_token().await.unwrap(), "T2");
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_without_mutation() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::new([
            ok("T1", 3600),
            Err(RelayError::UpstreamAuth("idp down".into())),
        ]);
        let cache = make_cache(fetcher.clone(), &clock);
        cache.get_token().await.unwrap();

        clock.advance(3600);
        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamAuth(_)));
        // The stale token is still held; it is just not handed out.
        assert_eq!(cache.cached_expiry().await, Some(T0 + 3600));
    }

    #[tokio::test]
    async fn test_initial_failure_leaves_cache_empty_and_retries_next_call() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::new([
            Err(RelayError::UpstreamAuth("bad credentials".into())),
            ok("T1", 3600),
        ]);
        let cache = make_cache(fetcher.clone(), &clock);

        assert!(cache.get_token().await.is_err());
        assert_eq!(cache.cached_expiry().await, None);
        assert_eq!(cache.get_token().await.unwrap(), "T1");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::new([ok("T1", 3600), ok("T2", 3600)]);
        let cache = make_cache(fetcher.clone(), &clock);
        cache.get_token().await.unwrap();

        cache.invalidate().await;
        assert_eq!(cache.cached_expiry().await, None);
        assert_eq!(cache.get_token().await.unwrap(), "T2");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_reject_current_token_clears() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::new([ok("T1", 3600)]);
        let cache = make_cache(fetcher, &clock);
        cache.get_token().await.unwrap();

        assert!(cache.reject("T1").await);
        assert_eq!(cache.cached_expiry().await, None);
    }

    #[tokio::test]
    async fn test_reject_stale_token_keeps_newer_one() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::new([ok("T1", 3600), ok("T2", 3600)]);
        let cache = make_cache(fetcher, &clock);
        cache.get_token().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.get_token().await.unwrap(), "T2");

        assert!(!cache.reject("T1").await);
        assert_eq!(cache.get_token().await.unwrap(), "T2");
    }

    #[tokio::test]
    async fn test_reject_on_empty_cache_is_noop() {
        let clock = ManualClock::starting_at(T0);
        let cache = make_cache(ScriptedFetcher::new([]), &clock);
        assert!(!cache.reject("T1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_stale_hits_share_one_fetch() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::slow([ok("T1", 3600)], Duration::from_millis(50));
        let cache = Arc::new(make_cache(fetcher.clone(), &clock));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "T1");
        }
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refresh_after_expiry_shares_one_fetch() {
        let clock = ManualClock::starting_at(T0);
        let fetcher = ScriptedFetcher::slow(
            [ok("T1", 3600), ok("T2", 3600)],
            Duration::from_millis(50),
        );
        let cache = Arc::new(make_cache(fetcher.clone(), &clock));
        cache.get_token().await.unwrap();

        clock.advance(3600);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "T2");
        }
        assert_eq!(fetcher.calls(), 2);
    }
}
