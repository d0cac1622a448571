//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::config::CacheConfig;

#[derive(Debug)]
struct Slot<V> {
    entry: CacheEntry<V>,
    /// Position of the key in the LRU tracker
    node: usize,
}

// == Cache ==
/// Generic key-value cache with per-entry expiry and LRU eviction.
///
/// Expiry is checked lazily: an expired entry is dropped by the read or
/// write that discovers it, or by an explicit [`cleanup`](Self::cleanup).
/// No background timer is involved.
#[derive(Debug)]
pub struct Cache<K, V> {
    /// Key-value storage
    entries: HashMap<K, Slot<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Hit, miss and eviction counters
    counters: Counters,
    /// Capacity and default ttl
    config: CacheConfig,
}

impl<K, V> Default for Cache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new Cache with the given capacity and default ttl.
    ///
    /// Zero values in `config` are replaced by the defaults.
    pub fn new(config: CacheConfig) -> Self {
        let config = config.normalized();
        Self {
            entries: HashMap::with_capacity(config.max_size),
            lru: LruTracker::with_capacity(config.max_size),
            counters: Counters::default(),
            config,
        }
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A live entry becomes the most recently used one and its hit counter is
    /// bumped. Missing and expired keys count as misses; expired entries are
    /// removed.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(slot) => slot.entry.is_expired(now),
            None => {
                self.counters.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.counters.record_miss();
            debug!(size = self.entries.len(), "Dropped expired cache entry on read");
            return None;
        }

        let slot = self.entries.get_mut(key)?;
        slot.entry.record_hit();
        let node = slot.node;
        let value = slot.entry.value.clone();

        self.lru.touch(node);
        self.counters.record_hit();
        Some(value)
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the value is overwritten, its ttl and hit
    /// count are reset and it becomes the most recently used entry. If the key
    /// is new and the cache is at capacity, the least recently used entry is
    /// evicted first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional lifetime (uses the configured ttl if None or zero)
    pub fn set(&mut self, key: K, value: V, ttl: Option<Duration>) {
        let ttl = ttl.filter(|t| !t.is_zero()).unwrap_or(self.config.ttl);
        let entry = CacheEntry::new(value, Instant::now(), ttl);

        // Overwrite in place
        if let Some(slot) = self.entries.get_mut(&key) {
            slot.entry = entry;
            let node = slot.node;
            self.lru.touch(node);
            return;
        }

        if self.entries.len() >= self.config.max_size {
            self.evict_oldest();
        }

        let node = self.lru.push(key.clone());
        self.entries.insert(key, Slot { entry, node });
    }

    // == Has ==
    /// Checks whether a live entry exists for `key`.
    ///
    /// Does not change recency or counters; an expired entry is removed.
    pub fn has<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(slot) if slot.entry.is_expired(now) => {
                self.remove_entry(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    // == Peek ==
    /// Returns a live value without touching recency, counters or expired
    /// entries.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|slot| !slot.entry.is_expired(now))
            .map(|slot| &slot.entry.value)
    }

    /// Returns the live entry for `key`, including its expiry and hit count.
    pub fn entry<Q>(&self, key: &Q) -> Option<&CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.entries
            .get(key)
            .map(|slot| &slot.entry)
            .filter(|entry| !entry.is_expired(now))
    }

    /// Returns how many times a live entry has been read since it was set.
    pub fn hits<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entry(key).map(|entry| entry.hits)
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns true if an entry was present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key)
    }

    // == Clear ==
    /// Removes every entry and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.counters = Counters::default();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn get_stats(&self) -> CacheStats {
        self.counters.snapshot(self.entries.len())
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed. Callers decide when to sweep;
    /// nothing runs this automatically.
    pub fn cleanup(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, slot)| slot.entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.remove_entry(&key);
        }

        if count > 0 {
            debug!(removed = count, size = self.entries.len(), "Cache cleanup");
        }
        count
    }

    /// Iterates stored keys from least to most recently used, expired or not.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.lru.iter()
    }

    // == Length ==
    /// Returns the current number of entries, including expired ones not yet
    /// discovered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.remove(key) {
            Some(slot) => {
                self.lru.remove(slot.node);
                true
            }
            None => false,
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.lru.evict_oldest() {
            self.entries.remove(&oldest);
            self.counters.record_eviction();
            debug!(max_size = self.config.max_size, "Evicted least recently used entry");
        }
    }
}
