//! Batch Processing
//!
//! Works through a large list in fixed-size batches, yielding to the runtime
//! between batches so other tasks keep making progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

/// How far a batch run got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Number of items handed to the processing function
    pub processed: usize,
    /// True if the run stopped early because it was cancelled
    pub cancelled: bool,
}

/// Cloneable cancellation switch for a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchCanceller {
    flag: Arc<AtomicBool>,
}

impl BatchCanceller {
    /// Stops the run before its next batch. The batch in progress finishes.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// == Batch Handle ==
/// Handle to a running batch job.
#[derive(Debug)]
pub struct BatchHandle {
    canceller: BatchCanceller,
    task: JoinHandle<BatchOutcome>,
}

impl BatchHandle {
    /// Stops the run before its next batch.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Returns a switch that can cancel the run from elsewhere.
    pub fn canceller(&self) -> BatchCanceller {
        self.canceller.clone()
    }

    /// Waits for the run to finish or stop.
    ///
    /// Fails only if the processing function panicked.
    pub async fn join(self) -> Result<BatchOutcome, JoinError> {
        self.task.await
    }
}

// == Spawn Batch ==
/// Spawns a task calling `process(item, index)` for every item, `batch_size`
/// items at a time. A `batch_size` of zero is treated as one.
///
/// # Panics
/// Panics if called outside a Tokio runtime.
pub fn spawn_batch<T, F>(items: Vec<T>, batch_size: usize, mut process: F) -> BatchHandle
where
    T: Send + 'static,
    F: FnMut(&T, usize) + Send + 'static,
{
    let batch_size = batch_size.max(1);
    let canceller = BatchCanceller::default();
    let flag = canceller.clone();

    let task = tokio::spawn(async move {
        let total = items.len();
        let mut processed = 0;

        while processed < total {
            if flag.is_cancelled() {
                debug!(processed, total, "Batch run cancelled");
                return BatchOutcome {
                    processed,
                    cancelled: true,
                };
            }

            let end = (processed + batch_size).min(total);
            for (offset, item) in items[processed..end].iter().enumerate() {
                process(item, processed + offset);
            }
            processed = end;

            if processed < total {
                tokio::task::yield_now().await;
            }
        }

        BatchOutcome {
            processed,
            cancelled: false,
        }
    });

    BatchHandle { canceller, task }
}

// == Chunk ==
/// Splits `items` into owned chunks of at most `size` elements. A `size` of
/// zero is treated as one.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}
