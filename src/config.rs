//! Configuration Module
//!
//! Parameters for every toolkit component, with the defaults the components
//! fall back to. Only the composition root reads the environment; the
//! components themselves are configured through these structs.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolkitError};

/// Default entry lifetime for caches (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default cache capacity
pub const DEFAULT_CACHE_MAX_SIZE: usize = 100;

/// Default number of tasks a queue runs at once
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Default number of extra rows rendered above and below the viewport
pub const DEFAULT_OVERSCAN: usize = 3;

// == Cache Config ==
/// Capacity and lifetime settings for a [`Cache`](crate::cache::Cache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of entries stored without an explicit ttl
    pub ttl: Duration,
    /// Maximum number of live entries
    pub max_size: usize,
}

impl CacheConfig {
    /// Creates a config, replacing zero values with the defaults.
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            ttl: if ttl.is_zero() { DEFAULT_CACHE_TTL } else { ttl },
            max_size: if max_size == 0 {
                DEFAULT_CACHE_MAX_SIZE
            } else {
                max_size
            },
        }
    }

    /// Preset for API response caching: 5 minutes, 200 entries.
    pub fn api() -> Self {
        Self::new(Duration::from_secs(5 * 60), 200)
    }

    /// Preset for short-lived query caching: 30 seconds, 50 entries.
    pub fn query() -> Self {
        Self::new(Duration::from_secs(30), 50)
    }

    /// Returns a copy with zero values replaced by the defaults.
    pub fn normalized(self) -> Self {
        Self::new(self.ttl, self.max_size)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            max_size: DEFAULT_CACHE_MAX_SIZE,
        }
    }
}

// == Queue Config ==
/// Concurrency bound for a [`TaskQueue`](crate::tasks::TaskQueue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of tasks running at the same time
    pub max_concurrent: usize,
}

impl QueueConfig {
    /// Rejects a zero concurrency bound, which would never start a task.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(ToolkitError::InvalidConfig(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

// == Window Config ==
/// Geometry of a fixed-row-height list viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Height of every row, in pixels
    pub item_height: f64,
    /// Height of the scrolling viewport, in pixels
    pub container_height: f64,
    /// Extra rows kept on each side of the visible area
    #[serde(default = "default_overscan")]
    pub overscan: usize,
}

fn default_overscan() -> usize {
    DEFAULT_OVERSCAN
}

impl WindowConfig {
    /// Creates a window config with the default overscan.
    pub fn new(item_height: f64, container_height: f64) -> Self {
        Self {
            item_height,
            container_height,
            overscan: DEFAULT_OVERSCAN,
        }
    }

    /// Sets the overscan row count.
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }
}

// == Toolkit Config ==
/// Settings for the shared instances built by [`Toolkit`](crate::Toolkit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Cache for API responses
    pub api_cache: CacheConfig,
    /// Cache for short-lived query results
    pub query_cache: CacheConfig,
    /// Shared work queue
    pub queue: QueueConfig,
}

impl ToolkitConfig {
    /// Creates a ToolkitConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PERF_API_CACHE_TTL_MS` - API cache ttl in milliseconds (default: 300000)
    /// - `PERF_API_CACHE_MAX_SIZE` - API cache capacity (default: 200)
    /// - `PERF_QUERY_CACHE_TTL_MS` - Query cache ttl in milliseconds (default: 30000)
    /// - `PERF_QUERY_CACHE_MAX_SIZE` - Query cache capacity (default: 50)
    /// - `PERF_QUEUE_MAX_CONCURRENT` - Queue concurrency bound (default: 3)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_cache: CacheConfig::new(
                env_parse("PERF_API_CACHE_TTL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.api_cache.ttl),
                env_parse("PERF_API_CACHE_MAX_SIZE").unwrap_or(defaults.api_cache.max_size),
            ),
            query_cache: CacheConfig::new(
                env_parse("PERF_QUERY_CACHE_TTL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.query_cache.ttl),
                env_parse("PERF_QUERY_CACHE_MAX_SIZE").unwrap_or(defaults.query_cache.max_size),
            ),
            queue: QueueConfig {
                max_concurrent: env_parse("PERF_QUEUE_MAX_CONCURRENT")
                    .filter(|n: &usize| *n > 0)
                    .unwrap_or(defaults.queue.max_concurrent),
            },
        }
    }
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            api_cache: CacheConfig::api(),
            query_cache: CacheConfig::query(),
            queue: QueueConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.max_size, 100);
    }

    #[test]
    fn test_cache_config_zero_values_fall_back() {
        let config = CacheConfig::new(Duration::ZERO, 0);
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_cache_presets() {
        assert_eq!(CacheConfig::api().max_size, 200);
        assert_eq!(CacheConfig::api().ttl, Duration::from_secs(300));
        assert_eq!(CacheConfig::query().max_size, 50);
        assert_eq!(CacheConfig::query().ttl, Duration::from_secs(30));
    }

    #[test]
    fn test_queue_config_validate() {
        assert!(QueueConfig::default().validate().is_ok());
        assert!(QueueConfig { max_concurrent: 0 }.validate().is_err());
    }

    #[test]
    fn test_window_config_deserialize_default_overscan() {
        let config: WindowConfig =
            serde_json::from_str(r#"{"item_height": 20.0, "container_height": 100.0}"#).unwrap();
        assert_eq!(config.overscan, DEFAULT_OVERSCAN);
    }

    #[test]
    fn test_toolkit_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("PERF_API_CACHE_TTL_MS");
        env::remove_var("PERF_API_CACHE_MAX_SIZE");
        env::remove_var("PERF_QUERY_CACHE_TTL_MS");
        env::remove_var("PERF_QUERY_CACHE_MAX_SIZE");
        env::remove_var("PERF_QUEUE_MAX_CONCURRENT");

        let config = ToolkitConfig::from_env();
        assert_eq!(config, ToolkitConfig::default());
    }
}
