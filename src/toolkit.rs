//! Toolkit Module
//!
//! Composition root owning the shared instances an application passes to its
//! consumers: two caches, a monitor and a work queue.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{Cache, CacheStats};
use crate::config::ToolkitConfig;
use crate::error::Result;
use crate::monitor::{MeasureStats, Monitor};
use crate::tasks::TaskQueue;

/// Shared cache of JSON values keyed by string.
pub type SharedCache = Arc<RwLock<Cache<String, Value>>>;

/// Shared instances built once and handed out by reference.
///
/// Cloning is cheap and every clone refers to the same instances.
#[derive(Clone, Debug)]
pub struct Toolkit {
    /// Cache for API responses
    pub api_cache: SharedCache,
    /// Cache for short-lived query results
    pub query_cache: SharedCache,
    /// Shared timing monitor
    pub monitor: Arc<RwLock<Monitor>>,
    /// Shared work queue
    pub queue: TaskQueue,
}

/// Queue counters at the time of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub pending: usize,
    pub active: usize,
    pub max_concurrent: usize,
}

/// Serializable report of every shared instance.
#[derive(Debug, Clone, Serialize)]
pub struct ToolkitSnapshot {
    pub api_cache: CacheStats,
    pub query_cache: CacheStats,
    pub queue: QueueSnapshot,
    pub measures: BTreeMap<String, MeasureStats>,
}

impl Toolkit {
    /// Builds every shared instance from configuration.
    pub fn from_config(config: &ToolkitConfig) -> Result<Self> {
        let queue = TaskQueue::from_config(&config.queue)?;
        info!(
            api_cache_max = config.api_cache.max_size,
            query_cache_max = config.query_cache.max_size,
            max_concurrent = config.queue.max_concurrent,
            "Toolkit initialized"
        );

        Ok(Self {
            api_cache: Arc::new(RwLock::new(Cache::new(config.api_cache))),
            query_cache: Arc::new(RwLock::new(Cache::new(config.query_cache))),
            monitor: Arc::new(RwLock::new(Monitor::new())),
            queue,
        })
    }

    /// Removes expired entries from both caches and returns how many were
    /// dropped.
    pub async fn cleanup(&self) -> usize {
        let api = self.api_cache.write().await.cleanup();
        let query = self.query_cache.write().await.cleanup();
        api + query
    }

    /// Captures cache, queue and monitor statistics.
    pub async fn snapshot(&self) -> ToolkitSnapshot {
        ToolkitSnapshot {
            api_cache: self.api_cache.read().await.get_stats(),
            query_cache: self.query_cache.read().await.get_stats(),
            queue: QueueSnapshot {
                pending: self.queue.pending(),
                active: self.queue.active(),
                max_concurrent: self.queue.max_concurrent(),
            },
            measures: self.monitor.read().await.get_all_stats(),
        }
    }
}
