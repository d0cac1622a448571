//! Debounce wrapper: only the last call within a quiet period runs.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::timer::TimerHandle;

/// Which edges of a burst of calls invoke the wrapped function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Run immediately on the first call after a quiet period
    pub leading: bool,
    /// Run with the latest arguments once calls stop for `delay`
    pub trailing: bool,
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self {
            leading: false,
            trailing: true,
        }
    }
}

struct DebounceState<A> {
    timer: Option<TimerHandle>,
    pending: Option<A>,
    last_fired: Option<Instant>,
    /// Bumped whenever a scheduled timer is superseded or cancelled
    epoch: u64,
}

struct DebounceInner<A> {
    f: Box<dyn Fn(A) + Send + Sync>,
    delay: Duration,
    options: DebounceOptions,
    state: Mutex<DebounceState<A>>,
}

// == Debouncer ==
/// A debounced function. Cloning yields another handle to the same timer.
pub struct Debouncer<A> {
    inner: Arc<DebounceInner<A>>,
}

impl<A> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Wraps `f` so that a burst of calls runs it once, `delay` after the last
/// call of the burst (and, with `leading`, once at its start).
pub fn debounce<A, F>(f: F, delay: Duration, options: DebounceOptions) -> Debouncer<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debouncer {
        inner: Arc::new(DebounceInner {
            f: Box::new(f),
            delay,
            options,
            state: Mutex::new(DebounceState {
                timer: None,
                pending: None,
                last_fired: None,
                epoch: 0,
            }),
        }),
    }
}

impl<A: Send + 'static> Debouncer<A> {
    // == Call ==
    /// Records `args` as the latest call and restarts the quiet-period timer.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn call(&self, args: A) {
        let inner = &self.inner;
        let now = Instant::now();
        let mut state = inner.state.lock();

        let quiet = state.timer.is_none()
            && state
                .last_fired
                .map_or(true, |at| now.duration_since(at) >= inner.delay);
        if inner.options.leading && quiet {
            state.last_fired = Some(now);
            drop(state);
            (inner.f)(args);
            return;
        }

        state.pending = Some(args);
        state.epoch += 1;
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }

        let epoch = state.epoch;
        let handle = Arc::clone(inner);
        state.timer = Some(TimerHandle::schedule(inner.delay, move || {
            fire_trailing(&handle, epoch)
        }));
    }

    // == Cancel ==
    /// Drops any pending call and its timer. Later calls behave as on a
    /// freshly constructed debouncer.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.epoch += 1;
        if let Some(timer) = state.timer.take() {
            timer.cancel();
            debug!("Debounced call cancelled");
        }
        state.pending = None;
        state.last_fired = None;
    }

    /// Runs the pending trailing call now instead of waiting for the timer.
    ///
    /// Returns true if a call ran.
    pub fn flush(&self) -> bool {
        let args = {
            let mut state = self.inner.state.lock();
            let Some(timer) = state.timer.take() else {
                return false;
            };
            timer.cancel();
            state.epoch += 1;
            take_trailing(&self.inner, &mut state)
        };

        match args {
            Some(args) => {
                (self.inner.f)(args);
                true
            }
            None => false,
        }
    }

    /// Returns true while a trailing timer is armed.
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }
}

fn take_trailing<A>(inner: &DebounceInner<A>, state: &mut DebounceState<A>) -> Option<A> {
    let args = state.pending.take();
    if !inner.options.trailing {
        return None;
    }
    if args.is_some() {
        state.last_fired = Some(Instant::now());
    }
    args
}

fn fire_trailing<A>(inner: &Arc<DebounceInner<A>>, epoch: u64) {
    let args = {
        let mut state = inner.state.lock();
        if state.epoch != epoch {
            return;
        }
        state.timer = None;
        take_trailing(inner, &mut state)
    };

    if let Some(args) = args {
        (inner.f)(args);
    }
}
