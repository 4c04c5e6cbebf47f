//! Process-wide, single-fire shutdown signal.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// One-way `Active → Signaled` event shared by every shutdown source.
///
/// Clones share the same state. The first call to [`signal`](Self::signal)
/// wins; later calls from any thread are no-ops. Waiting blocks on a condition
/// variable rather than polling.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl CancellationSignal {
    /// Creates an active signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Returns `true` only for the call that fired it.
    pub fn signal(&self) -> bool {
        let mut signaled = self.lock();
        if *signaled {
            return false;
        }
        *signaled = true;
        self.inner.condvar.notify_all();
        true
    }

    /// Returns `true` once the signal has fired.
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        *self.lock()
    }

    /// Blocks until the signal fires.
    pub fn wait(&self) {
        let mut signaled = self.lock();
        while !*signaled {
            signaled = self
                .inner
                .condvar
                .wait(signaled)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until the signal fires or `timeout` elapses.
    ///
    /// Returns `true` when the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.lock();
        while !*signaled {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let (guard, _) = self
                .inner
                .condvar
                .wait_timeout(signaled, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            signaled = guard;
        }
        true
    }

    // The flag is a plain bool, so a poisoned lock still holds a valid value.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .signaled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
