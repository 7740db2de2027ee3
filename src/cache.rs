//! The cache sitting in front of the filesystem.
//!
//! [`Cache`] is the capability the rest of the crate depends on; it is a pure
//! accelerator, so every value it holds can be recomputed from disk. The
//! default implementation, [`MemoryCache`], is an in-process [`moka`] cache
//! with a per-entry time-to-live.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache as MokaCache;
use moka::Expiry;
use tracing::debug;

use crate::archive::ArchiveEntry;

/// A value held in the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheValue {
    /// The raw bytes of an article file.
    Raw(Arc<[u8]>),

    /// A page of archive entries.
    Archive(Arc<[ArchiveEntry]>),
}

/// A shared key-value store with expiry. Writes are last-writer-wins.
pub trait Cache: Send + Sync {
    /// Returns the live value for `key`, if any.
    fn get(&self, key: &str) -> Option<CacheValue>;

    /// Stores `value` under `key` for `ttl`. A zero `ttl` never expires.
    fn set(&self, key: &str, value: CacheValue, ttl: Duration);

    /// Removes every entry.
    fn flush(&self);
}

#[derive(Clone)]
struct Entry {
    value: CacheValue,
    ttl: Option<Duration>,
}

/// Gives each entry the TTL it was inserted with.
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// In-process [`Cache`] backed by [`moka`].
///
/// Thread-safe: the underlying cache is internally synchronized, so a single
/// instance can be shared across request handlers.
pub struct MemoryCache {
    cache: MokaCache<String, Entry>,
}

impl MemoryCache {
    /// Creates a cache holding at most `capacity` entries.
    pub fn new(capacity: u64) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(capacity)
            .expire_after(EntryExpiry)
            .build();
        MemoryCache { cache }
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheValue> {
        let hit = self.cache.get(key).map(|entry| entry.value);
        debug!(key, hit = hit.is_some(), "cache lookup");
        hit
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Duration) {
        let ttl = (!ttl.is_zero()).then_some(ttl);
        self.cache.insert(key.to_owned(), Entry { value, ttl });
    }

    fn flush(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn raw(s: &str) -> CacheValue {
        CacheValue::Raw(Arc::from(s.as_bytes()))
    }

    #[test]
    fn test_get_after_set() {
        let cache = MemoryCache::new(16);
        cache.set("article:a", raw("hello"), Duration::from_secs(60));
        assert_eq!(Some(raw("hello")), cache.get("article:a"));
        assert_eq!(None, cache.get("article:b"));
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = MemoryCache::new(16);
        cache.set("k", raw("one"), Duration::from_secs(60));
        cache.set("k", raw("two"), Duration::from_secs(60));
        assert_eq!(Some(raw("two")), cache.get("k"));
    }

    #[test]
    fn test_entries_expire() {
        let cache = MemoryCache::new(16);
        cache.set("k", raw("v"), Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(None, cache.get("k"));
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let cache = MemoryCache::new(16);
        cache.set("k", raw("v"), Duration::ZERO);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(Some(raw("v")), cache.get("k"));
    }

    #[test]
    fn test_flush() {
        let cache = MemoryCache::new(16);
        cache.set("a", raw("1"), Duration::from_secs(60));
        cache.set("b", raw("2"), Duration::from_secs(60));
        cache.flush();
        assert_eq!(None, cache.get("a"));
        assert_eq!(None, cache.get("b"));
    }
}
