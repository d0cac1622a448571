//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
    /// Current number of entries in the cache
    pub size: usize,
    /// hits / (hits + misses), or 0.0 if no reads have been made
    pub hit_rate: f64,
}

// == Counters ==
/// Running counters owned by a cache; turned into [`CacheStats`] on demand.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Snapshot ==
    /// Builds a stats snapshot for a cache currently holding `size` entries.
    pub fn snapshot(&self, size: usize) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            size,
            hit_rate: hit_rate(self.hits, self.misses),
        }
    }
}

// == Hit Rate ==
/// Calculates the cache hit rate.
///
/// Returns hits / (hits + misses), or 0.0 if no requests have been made.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let stats = Counters::default().snapshot(0);
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(hit_rate(0, 0), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let mut counters = Counters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        assert_eq!(counters.snapshot(1).hit_rate, 1.0);
    }

    #[test]
    fn test_hit_rate_all_misses() {
        let mut counters = Counters::default();
        counters.record_miss();
        counters.record_miss();
        assert_eq!(counters.snapshot(0).hit_rate, 0.0);
    }

    #[test]
    fn test_hit_rate_three_quarters() {
        let mut counters = Counters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.snapshot(3).hit_rate, 0.75);
    }

    #[test]
    fn test_record_eviction() {
        let mut counters = Counters::default();
        counters.record_eviction();
        counters.record_eviction();
        let stats = counters.snapshot(42);
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.size, 42);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = Counters::default().snapshot(5);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["size"], 5);
        assert_eq!(json["hit_rate"], 0.0);
    }
}
