//! Memoization Module
//!
//! Wraps functions with a private [`Cache`] keyed by their arguments.
//!
//! Arguments are passed as a single value, usually a tuple. Without a custom
//! key function the key is the JSON serialization of that value, so `(1, "a")`
//! and `(1, "a")` share an entry while `(1, "b")` does not.
//!
//! Concurrent async calls with the same key are not coalesced: each call that
//! misses runs the wrapped function, and the last one to finish wins the
//! cache slot.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

use crate::cache::{Cache, CacheStats};
use crate::config::CacheConfig;

type KeyFn<A> = Arc<dyn Fn(&A) -> Option<String> + Send + Sync>;
type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

// == Options ==
/// Key derivation and cache sizing for a memoized function.
pub struct MemoizeOptions<A> {
    key_fn: KeyFn<A>,
    ttl: Option<Duration>,
    max_size: Option<usize>,
}

impl<A: Serialize + 'static> Default for MemoizeOptions<A> {
    fn default() -> Self {
        Self {
            key_fn: Arc::new(json_key::<A>),
            ttl: None,
            max_size: None,
        }
    }
}

impl<A: Serialize + 'static> MemoizeOptions<A> {
    /// Options keyed by the JSON serialization of the arguments.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A> MemoizeOptions<A> {
    /// Options keyed by a caller-supplied function.
    pub fn with_key_fn<F>(key_fn: F) -> Self
    where
        F: Fn(&A) -> String + Send + Sync + 'static,
    {
        Self {
            key_fn: Arc::new(move |args: &A| Some(key_fn(args))),
            ttl: None,
            max_size: None,
        }
    }

    /// Sets how long a result stays cached.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets how many distinct argument keys are cached.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    fn into_memo<R>(self) -> Memo<A, R> {
        let defaults = CacheConfig::default();
        let config = CacheConfig::new(
            self.ttl.unwrap_or(defaults.ttl),
            self.max_size.unwrap_or(defaults.max_size),
        );
        Memo {
            cache: Mutex::new(Cache::new(config)),
            key_fn: self.key_fn,
        }
    }
}

fn json_key<A: Serialize>(args: &A) -> Option<String> {
    match serde_json::to_string(args) {
        Ok(key) => Some(key),
        Err(err) => {
            warn!(error = %err, "Arguments cannot be used as a memoization key, calling uncached");
            None
        }
    }
}

// == Shared Memo State ==
struct Memo<A, R> {
    cache: Mutex<Cache<String, R>>,
    key_fn: KeyFn<A>,
}

impl<A, R: Clone> Memo<A, R> {
    fn key(&self, args: &A) -> Option<String> {
        (self.key_fn)(args)
    }

    fn lookup(&self, key: &str) -> Option<R> {
        self.cache.lock().get(key)
    }

    fn store(&self, key: String, value: R) {
        self.cache.lock().set(key, value, None);
    }

    fn clear(&self) {
        self.cache.lock().clear();
    }

    fn get_stats(&self) -> CacheStats {
        self.cache.lock().get_stats()
    }
}

// == Memoized ==
/// A memoized infallible function. Created by [`memoize`].
pub struct Memoized<A, R> {
    f: Box<dyn Fn(A) -> R + Send + Sync>,
    memo: Memo<A, R>,
}

impl<A, R: Clone> Memoized<A, R> {
    /// Returns the cached result for `args`, computing it on a miss.
    pub fn call(&self, args: A) -> R {
        let Some(key) = self.memo.key(&args) else {
            return (self.f)(args);
        };
        if let Some(hit) = self.memo.lookup(&key) {
            return hit;
        }

        let value = (self.f)(args);
        self.memo.store(key, value.clone());
        value
    }

    /// Drops every cached result and resets the statistics.
    pub fn clear(&self) {
        self.memo.clear();
    }

    /// Returns statistics of the underlying cache.
    pub fn get_stats(&self) -> CacheStats {
        self.memo.get_stats()
    }
}

/// Wraps `f` so repeated calls with equal arguments reuse the first result.
pub fn memoize<A, R, F>(f: F, options: MemoizeOptions<A>) -> Memoized<A, R>
where
    F: Fn(A) -> R + Send + Sync + 'static,
{
    Memoized {
        f: Box::new(f),
        memo: options.into_memo(),
    }
}

// == Fallible Memoized ==
/// A memoized function returning `Result`. Only `Ok` values are cached, so a
/// failure never poisons later calls with the same arguments.
pub struct FallibleMemoized<A, R, E> {
    f: Box<dyn Fn(A) -> Result<R, E> + Send + Sync>,
    memo: Memo<A, R>,
}

impl<A, R: Clone, E> FallibleMemoized<A, R, E> {
    /// Returns the cached value for `args`, or calls through and caches a
    /// successful result. Errors are returned unmodified.
    pub fn call(&self, args: A) -> Result<R, E> {
        let Some(key) = self.memo.key(&args) else {
            return (self.f)(args);
        };
        if let Some(hit) = self.memo.lookup(&key) {
            return Ok(hit);
        }

        let value = (self.f)(args)?;
        self.memo.store(key, value.clone());
        Ok(value)
    }

    pub fn clear(&self) {
        self.memo.clear();
    }

    pub fn get_stats(&self) -> CacheStats {
        self.memo.get_stats()
    }
}

/// Memoizes a fallible function, caching only successful results.
pub fn memoize_fallible<A, R, E, F>(f: F, options: MemoizeOptions<A>) -> FallibleMemoized<A, R, E>
where
    F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
{
    FallibleMemoized {
        f: Box::new(f),
        memo: options.into_memo(),
    }
}

// == Async Memoized ==
/// A memoized async function. The resolved `Ok` value is cached; errors are
/// returned unmodified and never cached.
pub struct AsyncMemoized<A, R, E> {
    f: Box<dyn Fn(A) -> BoxFuture<Result<R, E>> + Send + Sync>,
    memo: Memo<A, R>,
}

impl<A, R: Clone, E> AsyncMemoized<A, R, E> {
    /// Resolves to the cached value for `args`, or awaits the wrapped function
    /// and caches its successful result.
    ///
    /// The cache is not locked while the wrapped future runs.
    pub async fn call(&self, args: A) -> Result<R, E> {
        let Some(key) = self.memo.key(&args) else {
            return (self.f)(args).await;
        };
        if let Some(hit) = self.memo.lookup(&key) {
            return Ok(hit);
        }

        let value = (self.f)(args).await?;
        self.memo.store(key, value.clone());
        Ok(value)
    }

    pub fn clear(&self) {
        self.memo.clear();
    }

    pub fn get_stats(&self) -> CacheStats {
        self.memo.get_stats()
    }
}

/// Memoizes an async function returning `Result`.
pub fn memoize_async<A, R, E, F, Fut>(f: F, options: MemoizeOptions<A>) -> AsyncMemoized<A, R, E>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    AsyncMemoized {
        f: Box::new(move |args| Box::pin(f(args))),
        memo: options.into_memo(),
    }
}
