//! Task Queue
//!
//! Runs asynchronous units of work with a bound on how many run at once.
//!
//! Tasks start in submission order. Each `add` returns a [`TaskHandle`] that
//! resolves with that task's own outcome; a failing or panicking task only
//! affects its own handle.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::debug;

use crate::config::QueueConfig;
use crate::error::{Result, TaskError};

type Job = Box<dyn FnOnce(RunningSlot) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

struct QueueState {
    queue: VecDeque<Job>,
    running: usize,
}

struct QueueInner {
    max_concurrent: usize,
    state: Mutex<QueueState>,
}

// == Task Queue ==
/// Concurrency-bounded FIFO executor. Cloning yields another handle to the
/// same queue.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<QueueInner>,
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("max_concurrent", &self.inner.max_concurrent)
            .field("pending", &self.pending())
            .field("active", &self.active())
            .finish()
    }
}

impl TaskQueue {
    // == Constructor ==
    /// Creates a queue running at most `max_concurrent` tasks at once.
    ///
    /// Returns an error if `max_concurrent` is zero.
    pub fn new(max_concurrent: usize) -> Result<Self> {
        Self::from_config(&QueueConfig { max_concurrent })
    }

    /// Creates a queue from configuration.
    pub fn from_config(config: &QueueConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(QueueInner {
                max_concurrent: config.max_concurrent,
                state: Mutex::new(QueueState {
                    queue: VecDeque::new(),
                    running: 0,
                }),
            }),
        })
    }

    // == Add ==
    /// Appends a task and starts it as soon as a slot is free.
    ///
    /// The task is spawned on the current Tokio runtime. Outside a runtime it
    /// stays queued until a later `add` made inside one dispatches it.
    pub fn add<T, E, F, Fut>(&self, task: F) -> TaskHandle<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |slot: RunningSlot| {
            Box::pin(async move {
                let outcome = task().await;
                // Free the slot before waking the caller
                drop(slot);
                let _ = tx.send(outcome);
            })
        });

        self.inner.state.lock().queue.push_back(job);
        dispatch(&self.inner);
        TaskHandle { rx }
    }

    /// Number of tasks waiting to start.
    pub fn pending(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Number of tasks currently running.
    pub fn active(&self) -> usize {
        self.inner.state.lock().running
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    // == Clear ==
    /// Discards every task that has not started yet and returns how many
    /// were dropped. Their handles resolve to [`TaskError::Discarded`].
    /// Running tasks are not affected.
    pub fn clear(&self) -> usize {
        let dropped: Vec<Job> = self.inner.state.lock().queue.drain(..).collect();
        let count = dropped.len();
        drop(dropped);
        if count > 0 {
            debug!(discarded = count, "Task queue cleared");
        }
        count
    }
}

/// Occupies one concurrency slot; releasing it starts the next task.
struct RunningSlot {
    inner: Arc<QueueInner>,
}

impl Drop for RunningSlot {
    fn drop(&mut self) {
        self.inner.state.lock().running -= 1;
        dispatch(&self.inner);
    }
}

fn dispatch(inner: &Arc<QueueInner>) {
    let Ok(runtime) = Handle::try_current() else {
        debug!("No Tokio runtime available, tasks stay queued");
        return;
    };

    loop {
        let job = {
            let mut state = inner.state.lock();
            if state.running >= inner.max_concurrent {
                return;
            }
            let Some(job) = state.queue.pop_front() else {
                return;
            };
            state.running += 1;
            job
        };

        let slot = RunningSlot {
            inner: Arc::clone(inner),
        };
        runtime.spawn(job(slot));
    }
}

// == Task Handle ==
/// Resolves with the outcome of one queued task.
#[must_use = "a task handle does nothing unless awaited"]
pub struct TaskHandle<T, E> {
    rx: oneshot::Receiver<std::result::Result<T, E>>,
}

impl<T, E> Future for TaskHandle<T, E> {
    type Output = std::result::Result<T, TaskError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(TaskError::Failed(err)),
            Err(_) => Err(TaskError::Discarded),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;
    use tokio_test::{assert_pending, assert_ready};

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(TaskQueue::new(0).is_err());
        assert_eq!(TaskQueue::new(2).unwrap().max_concurrent(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bound_is_respected() {
        let queue = TaskQueue::new(2).unwrap();
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let current = Arc::clone(&current);
                let peak = Arc::clone(&peak);
                let observer = queue.clone();
                queue.add(move || async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    assert!(observer.active() <= 2);
                    sleep(Duration::from_millis(10)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, String>(i)
                })
            })
            .collect();

        assert_eq!(queue.active(), 2);
        assert_eq!(queue.pending(), 3);

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results, vec![0, 1, 2, 3, 4]);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(queue.active(), 0);
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tasks_start_in_fifo_order() {
        let queue = TaskQueue::new(1).unwrap();
        let started = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let started = Arc::clone(&started);
                queue.add(move || async move {
                    started.lock().push(i);
                    // Later tasks finish faster
                    sleep(Duration::from_millis(40 - i * 10)).await;
                    Ok::<_, ()>(())
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*started.lock(), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_isolated() {
        let queue = TaskQueue::new(2).unwrap();

        let ok = queue.add(|| async { Ok::<_, String>(1) });
        let failed = queue.add(|| async {
            sleep(Duration::from_millis(5)).await;
            Err::<i32, _>("broken".to_string())
        });
        let after = queue.add(|| async { Ok::<_, String>(3) });

        assert_eq!(ok.await, Ok(1));
        assert_eq!(failed.await, Err(TaskError::Failed("broken".to_string())));
        assert_eq!(after.await, Ok(3));
        assert_eq!(queue.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_queued_tasks_only() {
        let queue = TaskQueue::new(1).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        let first = {
            let ran = Arc::clone(&ran);
            queue.add(move || async move {
                sleep(Duration::from_millis(20)).await;
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>("first")
            })
        };
        let second = {
            let ran = Arc::clone(&ran);
            queue.add(move || async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>("second")
            })
        };
        let mut second = tokio_test::task::spawn(second);
        assert_pending!(second.poll());

        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.clear(), 1);
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.active(), 1);

        assert_eq!(assert_ready!(second.poll()), Err(TaskError::Discarded));
        assert_eq!(first.await, Ok("first"));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(queue.clear(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_task_frees_its_slot() {
        let queue = TaskQueue::new(1).unwrap();

        let boom = queue.add(|| async {
            if true {
                panic!("task exploded");
            }
            Ok::<i32, ()>(0)
        });
        let next = queue.add(|| async { Ok::<_, ()>(2) });

        assert_eq!(boom.await, Err(TaskError::Discarded));
        assert_eq!(next.await, Ok(2));
        assert_eq!(queue.active(), 0);
    }

    #[test]
    fn test_add_outside_runtime_stays_queued() {
        let queue = TaskQueue::new(1).unwrap();
        let handle = queue.add(|| async { Ok::<_, ()>(5) });

        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.active(), 0);

        // Dropping the queue drops the job and its sender
        drop(queue);
        let mut handle = tokio_test::task::spawn(handle);
        assert_eq!(assert_ready!(handle.poll()), Err(TaskError::Discarded));
    }
}
