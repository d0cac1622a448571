//! Tasks Module
//!
//! Asynchronous work scheduling on the Tokio runtime.
//!
//! # Components
//! - Task Queue: FIFO executor with a concurrency bound
//! - Batch: cancellable batch processing of large lists

mod batch;
mod queue;

pub use batch::{chunk, spawn_batch, BatchCanceller, BatchHandle, BatchOutcome};
pub use queue::{TaskHandle, TaskQueue};
