//! Fetched-unit caching with LRU eviction and a per-lookup staleness window

use crate::verses::{Edition, UnitKind, UnitText};
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Default cache capacity (number of fetched units)
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct QueryKey {
    pub kind: UnitKind,
    pub locator: u32,
    pub edition: Edition,
}

impl QueryKey {
    pub fn new(kind: UnitKind, locator: u32, edition: &Edition) -> Self {
        Self {
            kind,
            locator,
            edition: edition.clone(),
        }
    }
}

struct CachedUnit {
    unit: Arc<UnitText>,
    fetched_at: DateTime<Utc>,
}

pub struct QueryCache {
    cache: Mutex<LruCache<QueryKey, CachedUnit>>,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a unit. With `max_age`, entries fetched longer ago than that
    /// are treated as missing and evicted.
    pub fn get(&self, key: &QueryKey, max_age: Option<Duration>) -> Option<Arc<UnitText>> {
        self.get_at(key, max_age, Utc::now())
    }

    fn get_at(
        &self,
        key: &QueryKey,
        max_age: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Option<Arc<UnitText>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let stale = match (cache.get(key), max_age) {
            (None, _) => return None,
            (Some(entry), Some(max_age)) => now - entry.fetched_at > max_age,
            (Some(_), None) => false,
        };
        if stale {
            cache.pop(key);
            return None;
        }
        cache.get(key).map(|entry| Arc::clone(&entry.unit))
    }

    pub fn put(&self, key: QueryKey, unit: Arc<UnitText>) {
        self.put_at(key, unit, Utc::now());
    }

    fn put_at(&self, key: QueryKey, unit: Arc<UnitText>, fetched_at: DateTime<Utc>) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(key, CachedUnit { unit, fetched_at });
    }

    pub fn clear(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn stats(&self) -> (usize, usize) {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        (cache.len(), cache.cap().get())
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
