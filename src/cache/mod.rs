//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, MAX_TTL};
pub use lru::LruTracker;
pub use stats::{hit_rate, CacheStats};
pub use store::Cache;
