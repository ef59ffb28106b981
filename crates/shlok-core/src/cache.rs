//! Revision-keyed corpus cache using moka
//!
//! Corpora are stored under the [`SourceFingerprint`] of the bytes they were
//! parsed from. A changed file has a new fingerprint and therefore misses,
//! so a hit always returns exactly what a fresh load would.

use crate::record::{Corpus, SourceFingerprint};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Parsed corpora keyed by source revision
#[derive(Debug, Clone)]
pub struct CorpusCache {
    inner: Cache<SourceFingerprint, Arc<Corpus>>,
}

impl CorpusCache {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Insert corpus for a revision
    #[inline]
    pub async fn insert(&self, key: SourceFingerprint, corpus: Arc<Corpus>) {
        self.inner.insert(key, corpus).await;
    }

    /// Get corpus for a revision
    #[inline]
    pub async fn get(&self, key: &SourceFingerprint) -> Option<Arc<Corpus>> {
        self.inner.get(key).await
    }

    /// Get the cached corpus or load and insert it
    ///
    /// # Errors
    /// Propagates the loader's error; nothing is cached on failure.
    pub async fn try_get_or_insert_with<E, F, Fut>(
        &self,
        key: SourceFingerprint,
        f: F,
    ) -> Result<Arc<Corpus>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Corpus, E>>,
    {
        if let Some(cached) = self.get(&key).await {
            tracing::trace!(location = %key.location, "corpus cache hit");
            return Ok(cached);
        }

        let corpus = Arc::new(f().await?);
        self.insert(key, Arc::clone(&corpus)).await;

        Ok(corpus)
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for CorpusCache {
    /// A handful of revisions is plenty for a single corpus file
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::VerseRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::SystemTime;

    fn fingerprint(len: u64) -> SourceFingerprint {
        SourceFingerprint {
            location: "data/gita-shloks.csv".to_string(),
            modified: SystemTime::UNIX_EPOCH,
            len,
        }
    }

    fn corpus(n: usize) -> Corpus {
        (0..n)
            .map(|i| VerseRecord::new("1", (i + 1).to_string(), "", "", ""))
            .collect()
    }

    #[tokio::test]
    async fn insert_and_get() {
        let cache = CorpusCache::new(4);
        cache.insert(fingerprint(1), Arc::new(corpus(2))).await;

        assert_eq!(cache.get(&fingerprint(1)).await.unwrap().len(), 2);
        assert!(cache.get(&fingerprint(2)).await.is_none());
    }

    #[tokio::test]
    async fn loads_once_per_revision() {
        let cache = CorpusCache::default();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let loaded = cache
                .try_get_or_insert_with(fingerprint(10), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(corpus(3))
                })
                .await
                .unwrap();
            assert_eq!(loaded.len(), 3);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // New revision misses
        cache
            .try_get_or_insert_with(fingerprint(11), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(corpus(4))
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let cache = CorpusCache::default();
        let err = cache
            .try_get_or_insert_with(fingerprint(1), || async { Err::<Corpus, _>("boom") })
            .await
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(cache.get(&fingerprint(1)).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_all_clears() {
        let cache = CorpusCache::new(4);
        cache.insert(fingerprint(1), Arc::new(corpus(1))).await;
        cache.invalidate_all();
        assert!(cache.get(&fingerprint(1)).await.is_none());
    }
}
