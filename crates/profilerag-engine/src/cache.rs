//! Bounded response cache with time-based expiry.
//!
//! Recency order is maintained by `lru`: a hit or a re-insert moves the key
//! to the most-recent end, and overflow evicts exactly one least-recent entry.
//! The insertion timestamp is not refreshed by hits.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

use profilerag_core::types::QueryResponse;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub question: String,
    pub top_k: usize,
}

impl CacheKey {
    pub fn new(question: &str, top_k: usize) -> Self {
        Self { question: question.to_string(), top_k }
    }
}

struct CacheEntry {
    value: QueryResponse,
    inserted_at: Instant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

struct Inner {
    entries: LruCache<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
}

pub struct ResponseCache {
    inner: Mutex<Inner>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { inner: Mutex::new(Inner { entries: LruCache::new(capacity), hits: 0, misses: 0 }), ttl }
    }

    pub fn get(&self, key: &CacheKey) -> Option<QueryResponse> {
        let mut inner = self.inner.lock();
        match inner.entries.peek(key).map(|e| e.inserted_at.elapsed() > self.ttl) {
            None => {
                inner.misses += 1;
                None
            }
            Some(true) => {
                inner.entries.pop(key);
                inner.misses += 1;
                None
            }
            Some(false) => {
                inner.hits += 1;
                inner.entries.get(key).map(|e| e.value.clone())
            }
        }
    }

    pub fn put(&self, key: CacheKey, value: QueryResponse) {
        let mut inner = self.inner.lock();
        if let Some((evicted, _)) = inner.entries.push(key.clone(), CacheEntry { value, inserted_at: Instant::now() }) {
            if evicted != key {
                tracing::debug!(question = %evicted.question, top_k = evicted.top_k, "evicted cached response");
            }
        }
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.contains(key)
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats { size: inner.entries.len(), hits: inner.hits, misses: inner.misses }
    }
}
