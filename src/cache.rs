//! Query result cache keyed by query identity.
//!
//! Entries live until they are invalidated or their time-to-live runs out.
//! Failed loads are never cached, so the next request tries again.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A cached result plus the generation it was loaded in. Every successful
/// load gets a new generation number.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub data: Arc<T>,
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            generation: self.generation,
            loaded_at: self.loaded_at,
        }
    }
}

struct Entry<T> {
    snapshot: Snapshot<T>,
    expires_at: Option<Instant>,
}

impl<T> Entry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

pub struct ResultCache<T> {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, Entry<T>>>,
    generations: AtomicU64,
}

impl<T> ResultCache<T> {
    /// `ttl = None` keeps entries until they are invalidated.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    /// Returns the cached result for `key`, or runs `load` and caches its
    /// result. The lock is held while loading, so concurrent callers for a
    /// cold key share a single load.
    pub async fn get_or_load<F, Fut>(&self, key: &str, load: F) -> Result<Snapshot<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        if let Some(entry) = entries.get(key) {
            if entry.is_fresh(now) {
                debug!(generation = entry.snapshot.generation, "Cache hit");
                return Ok(entry.snapshot.clone());
            }
            debug!("Cache entry expired");
        }

        let data = load().await?;
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = Snapshot {
            data: Arc::new(data),
            generation,
            loaded_at: Utc::now(),
        };

        info!(generation, "Cache entry loaded");
        entries.insert(
            key.to_string(),
            Entry {
                snapshot: snapshot.clone(),
                expires_at: self.ttl.map(|ttl| now + ttl),
            },
        );

        Ok(snapshot)
    }

    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().await.remove(key).is_some()
    }

    pub async fn invalidate_all(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let dropped = entries.len();
        entries.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    async fn load_counting(calls: &AtomicUsize) -> Result<Vec<u32>> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let cache = ResultCache::new(None);
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_load("q", || load_counting(&calls)).await.unwrap();
        let second = cache.get_or_load("q", || load_counting(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.generation, second.generation);
        assert_eq!(*second.data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = ResultCache::new(None);
        let calls = AtomicUsize::new(0);

        cache.get_or_load("a", || load_counting(&calls)).await.unwrap();
        cache.get_or_load("b", || load_counting(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload_with_new_generation() {
        let cache = ResultCache::new(None);
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_load("q", || load_counting(&calls)).await.unwrap();
        assert_eq!(cache.invalidate_all().await, 1);
        let second = cache.get_or_load("q", || load_counting(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(second.generation > first.generation);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_reloads() {
        let cache = ResultCache::new(Some(Duration::ZERO));
        let calls = AtomicUsize::new(0);

        cache.get_or_load("q", || load_counting(&calls)).await.unwrap();
        cache.get_or_load("q", || load_counting(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: ResultCache<Vec<u32>> = ResultCache::new(None);
        let calls = AtomicUsize::new(0);

        let failed = cache
            .get_or_load("q", || async { Err(anyhow::anyhow!("warehouse down")) })
            .await;
        assert!(failed.is_err());

        cache.get_or_load("q", || load_counting(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!cache.invalidate("other").await);
    }
}
