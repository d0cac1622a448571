//! Throttle wrapper: at most one run per window, with a trailing run for
//! calls made during the window.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use super::timer::TimerHandle;

struct ThrottleState<A> {
    in_throttle: bool,
    pending: Option<A>,
    timer: Option<TimerHandle>,
    epoch: u64,
}

struct ThrottleInner<A> {
    f: Box<dyn Fn(A) + Send + Sync>,
    limit: Duration,
    state: Mutex<ThrottleState<A>>,
}

// == Throttler ==
/// A throttled function. Cloning yields another handle to the same window.
pub struct Throttler<A> {
    inner: Arc<ThrottleInner<A>>,
}

impl<A> Clone for Throttler<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Wraps `f` so it runs at most once per `limit` window.
///
/// The first call runs immediately and opens a window. Calls made while the
/// window is open are remembered (latest wins); when the window closes the
/// remembered call runs and opens the next window.
pub fn throttle<A, F>(f: F, limit: Duration) -> Throttler<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Throttler {
        inner: Arc::new(ThrottleInner {
            f: Box::new(f),
            limit,
            state: Mutex::new(ThrottleState {
                in_throttle: false,
                pending: None,
                timer: None,
                epoch: 0,
            }),
        }),
    }
}

impl<A: Send + 'static> Throttler<A> {
    // == Call ==
    /// Runs `f(args)` now if no window is open, otherwise remembers `args`
    /// for the end of the window.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn call(&self, args: A) {
        let mut state = self.inner.state.lock();
        if state.in_throttle {
            state.pending = Some(args);
            return;
        }

        state.in_throttle = true;
        open_window(&self.inner, &mut state);
        drop(state);
        (self.inner.f)(args);
    }

    // == Cancel ==
    /// Closes the current window and discards any remembered call.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.epoch += 1;
        if let Some(timer) = state.timer.take() {
            timer.cancel();
            debug!("Throttle window cancelled");
        }
        state.in_throttle = false;
        state.pending = None;
    }

    /// Returns true while a window is open.
    pub fn is_throttled(&self) -> bool {
        self.inner.state.lock().in_throttle
    }

    /// Returns true if a call is waiting for the window to close.
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().pending.is_some()
    }
}

fn open_window<A: Send + 'static>(inner: &Arc<ThrottleInner<A>>, state: &mut ThrottleState<A>) {
    state.epoch += 1;
    let epoch = state.epoch;
    let handle = Arc::clone(inner);
    state.timer = Some(TimerHandle::schedule(inner.limit, move || {
        close_window(&handle, epoch)
    }));
}

fn close_window<A: Send + 'static>(inner: &Arc<ThrottleInner<A>>, epoch: u64) {
    let args = {
        let mut state = inner.state.lock();
        if state.epoch != epoch {
            return;
        }
        match state.pending.take() {
            Some(args) => {
                open_window(inner, &mut state);
                args
            }
            None => {
                state.in_throttle = false;
                state.timer = None;
                return;
            }
        }
    };

    (inner.f)(args);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl Fn(i32) + Send + Sync + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |x| sink.lock().push(x))
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_steady_calls_fire_twice_per_window() {
        let (calls, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(100));

        // Calls at 0, 10, ..., 100ms, the last one on the window boundary
        for i in 0..=10 {
            if i > 0 {
                sleep(Duration::from_millis(10)).await;
            }
            throttled.call(i);
        }
        assert_eq!(*calls.lock(), vec![0]);

        sleep(Duration::from_millis(5)).await;
        assert_eq!(*calls.lock(), vec![0, 10]);

        // The trailing run opened a window with nothing pending, which closes
        sleep(Duration::from_millis(200)).await;
        assert_eq!(*calls.lock(), vec![0, 10]);
        assert!(!throttled.is_throttled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_single_call_closes_window() {
        let (calls, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(50));

        throttled.call(1);
        assert!(throttled.is_throttled());
        assert!(!throttled.is_pending());

        sleep(Duration::from_millis(60)).await;
        assert!(!throttled.is_throttled());

        throttled.call(2);
        assert_eq!(*calls.lock(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_trailing_reopens_window() {
        let (calls, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(100));

        throttled.call(1);
        throttled.call(2);

        // 2 fires at 100ms and opens a new window until 200ms
        sleep(Duration::from_millis(110)).await;
        assert_eq!(*calls.lock(), vec![1, 2]);
        assert!(throttled.is_throttled());

        throttled.call(3);
        assert_eq!(*calls.lock(), vec![1, 2]);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(*calls.lock(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_cancel_discards_pending() {
        let (calls, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(100));

        throttled.call(1);
        throttled.call(2);
        assert!(throttled.is_pending());

        throttled.cancel();
        assert!(!throttled.is_throttled());
        assert!(!throttled.is_pending());

        sleep(Duration::from_millis(200)).await;
        assert_eq!(*calls.lock(), vec![1]);

        // Window is closed, so the next call fires immediately
        throttled.call(3);
        assert_eq!(*calls.lock(), vec![1, 3]);
    }
}
