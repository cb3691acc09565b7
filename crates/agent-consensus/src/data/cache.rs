//! Caching layer for market snapshots
//!
//! All agents of one analysis read the same snapshot, so the provider is
//! wrapped in a short-lived cache to fetch each ticker once.

use super::{MarketDataProvider, MarketSnapshot};
use crate::error::Result;
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Thread-safe cache of snapshots keyed by upper-cased ticker
pub struct SnapshotCache {
    cache: Arc<RwLock<TimedCache<String, MarketSnapshot>>>,
}

impl SnapshotCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a snapshot from the cache
    pub async fn get(&self, ticker: &str) -> Option<MarketSnapshot> {
        let mut cache = self.cache.write().await;
        cache.cache_get(&key(ticker)).cloned()
    }

    /// Insert a snapshot into the cache
    pub async fn insert(&self, ticker: &str, snapshot: MarketSnapshot) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key(ticker), snapshot);
    }

    /// Invalidate a specific cache entry
    pub async fn invalidate(&self, ticker: &str) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(&key(ticker));
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for SnapshotCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

fn key(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Provider decorator that serves repeated requests from a [`SnapshotCache`]
///
/// Misses are fetched one at a time so agents racing on the same ticker
/// trigger a single upstream fetch.
pub struct CachedProvider<P> {
    inner: P,
    cache: SnapshotCache,
    fetch_lock: Mutex<()>,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: SnapshotCache::new(ttl),
            fetch_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot> {
        if let Some(snapshot) = self.cache.get(ticker).await {
            tracing::debug!(ticker, "Cache hit for snapshot");
            return Ok(snapshot);
        }

        let _guard = self.fetch_lock.lock().await;

        // Another task may have filled the entry while we waited.
        if let Some(snapshot) = self.cache.get(ticker).await {
            tracing::debug!(ticker, "Cache hit for snapshot after wait");
            return Ok(snapshot);
        }

        tracing::debug!(ticker, provider = self.inner.name(), "Cache miss for snapshot");

        let snapshot = self.inner.snapshot(ticker).await?;
        self.cache.insert(ticker, snapshot.clone()).await;

        Ok(snapshot)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsensusError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MarketDataProvider for CountingProvider {
        async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ticker == "FAIL" {
                return Err(ConsensusError::data(ticker, "upstream down"));
            }
            Ok(MarketSnapshot::new(ticker))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        assert!(cache.is_empty().await);

        cache.insert("aapl", MarketSnapshot::new("AAPL")).await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("AAPL").await.is_some());

        cache.invalidate("AAPL").await;
        assert!(cache.get("AAPL").await.is_none());

        cache.insert("MSFT", MarketSnapshot::new("MSFT")).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = SnapshotCache::new(Duration::from_millis(100));
        cache.insert("AAPL", MarketSnapshot::new("AAPL")).await;
        assert!(cache.get("AAPL").await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_requests_fetch_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Arc::new(CachedProvider::new(
            CountingProvider {
                calls: Arc::clone(&calls),
            },
            Duration::from_secs(60),
        ));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let provider = Arc::clone(&provider);
                tokio::spawn(async move { provider.snapshot("TCS.NS").await })
            })
            .collect();
        for handle in futures::future::join_all(handles).await {
            assert!(handle.unwrap().is_ok());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.name(), "counting");
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CachedProvider::new(
            CountingProvider {
                calls: Arc::clone(&calls),
            },
            Duration::from_secs(60),
        );

        assert!(provider.snapshot("FAIL").await.is_err());
        assert!(provider.snapshot("FAIL").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(provider.cache().is_empty().await);
    }
}
