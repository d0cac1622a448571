//! Delayed callback handle on top of the Tokio timer.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

// == Timer Handle ==
/// A callback scheduled to run once after a delay.
///
/// Dropping the handle does not cancel the callback; call
/// [`cancel`](Self::cancel) for that.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Schedules `callback` to run `delay` from now.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn schedule<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let deadline = Instant::now() + delay;
        let task = tokio::spawn(async move {
            sleep_until(deadline).await;
            callback();
        });
        Self { task }
    }

    /// Stops the callback from running. A no-op if it already ran or was
    /// already cancelled.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Returns true once the callback ran or the timer was cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
