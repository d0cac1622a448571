//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

/// Upper bound on an entry's lifetime; longer ttls saturate to it.
pub const MAX_TTL: Duration = Duration::from_secs(86_400 * 365 * 30);

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant after which the entry is no longer served
    pub expiry: Instant,
    /// Number of successful reads since the entry was last written
    pub hits: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry that expires `ttl` after `now`, capped at
    /// [`MAX_TTL`].
    pub fn new(value: V, now: Instant, ttl: Duration) -> Self {
        let ttl = ttl.min(MAX_TTL);
        Self {
            value,
            expiry: now.checked_add(ttl).unwrap_or(now),
            hits: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is still live at exactly its expiry instant and expired
    /// strictly after it.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expiry
    }

    // == Time Remaining ==
    /// Returns how long the entry stays live, or zero once expired.
    pub fn time_remaining(&self, now: Instant) -> Duration {
        self.expiry.saturating_duration_since(now)
    }

    /// Records a read of this entry.
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new("test_value", now, Duration::from_secs(60));

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.hits, 0);
        assert_eq!(entry.expiry, now + Duration::from_secs(60));
        assert!(!entry.is_expired(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::new(1, now, Duration::from_millis(100));

        // Live at the expiry instant, expired one tick after
        assert!(!entry.is_expired(now + Duration::from_millis(100)));
        assert!(entry.is_expired(now + Duration::from_millis(101)));
    }

    #[test]
    fn test_time_remaining() {
        let now = Instant::now();
        let entry = CacheEntry::new(1, now, Duration::from_secs(10));

        assert_eq!(
            entry.time_remaining(now + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
        assert_eq!(
            entry.time_remaining(now + Duration::from_secs(20)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let now = Instant::now();
        let entry = CacheEntry::new(1, now, Duration::MAX);

        assert_eq!(entry.expiry, now + MAX_TTL);
        assert!(!entry.is_expired(now + Duration::from_secs(86_400 * 365)));
    }

    #[test]
    fn test_record_hit() {
        let mut entry = CacheEntry::new(1, Instant::now(), Duration::from_secs(1));
        entry.record_hit();
        entry.record_hit();
        assert_eq!(entry.hits, 2);
    }
}
