//! Async delay and trailing-edge debounce on the Tokio timer.
//!
//! # Invariants
//! - `delay` always resolves after the duration and cannot be cancelled.
//! - A `Debounced` handle has at most one pending call; a new call replaces
//!   it and superseded arguments are dropped without running.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Suspends the calling task for `duration`.
pub async fn delay(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Wraps `func` so rapid calls collapse into one trailing call after `wait`.
pub fn debounce<A, F>(func: F, wait: Duration) -> Debounced<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced {
        inner: Arc::new(DebounceState {
            func: Box::new(func),
            wait,
            pending: Mutex::new(None),
        }),
    }
}

/// Handle returned by [`debounce`]. Clones share one pending timer.
pub struct Debounced<A> {
    inner: Arc<DebounceState<A>>,
}

struct DebounceState<A> {
    func: Box<dyn Fn(A) + Send + Sync>,
    wait: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Send + 'static> Debounced<A> {
    /// Schedules `func(args)` after the quiet interval, replacing any
    /// pending call.
    ///
    /// # Panics
    /// - Panics when called outside a Tokio runtime.
    pub fn call(&self, args: A) {
        let state = Arc::clone(&self.inner);
        let wait = self.inner.wait;
        let mut pending = self.inner.lock_pending();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            (state.func)(args);
        }));
    }

    /// Drops the pending call, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.inner.lock_pending().take() {
            previous.abort();
        }
    }

    /// Returns whether a call is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.inner
            .lock_pending()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<A> DebounceState<A> {
    fn lock_pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
