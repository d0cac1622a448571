//! Rate Control Module
//!
//! Debounce and throttle wrappers that gate how often a function runs.
//!
//! Both wrappers schedule their delayed calls as Tokio tasks, so `call` must
//! be made from within a Tokio runtime. Cancellation is synchronous: once
//! `cancel()` returns, no previously scheduled call will run.

mod debounce;
mod throttle;
mod timer;

pub use debounce::{debounce, DebounceOptions, Debouncer};
pub use throttle::{throttle, Throttler};
pub use timer::TimerHandle;
