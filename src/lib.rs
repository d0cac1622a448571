//! Perf Toolkit - In-process resource management primitives
//!
//! TTL/LRU caching, memoization, debounce and throttle, a concurrency-bounded
//! task queue, list windowing and timing statistics.

pub mod cache;
pub mod config;
pub mod error;
pub mod memoize;
pub mod monitor;
pub mod rate;
pub mod tasks;
pub mod toolkit;
pub mod window;

pub use cache::{Cache, CacheStats};
pub use config::{CacheConfig, QueueConfig, ToolkitConfig, WindowConfig};
pub use error::{TaskError, ToolkitError};
pub use memoize::{memoize, memoize_async, memoize_fallible, MemoizeOptions};
pub use monitor::{MeasureStats, Monitor};
pub use rate::{debounce, throttle, DebounceOptions};
pub use tasks::TaskQueue;
pub use toolkit::Toolkit;
pub use window::WindowCalculator;
