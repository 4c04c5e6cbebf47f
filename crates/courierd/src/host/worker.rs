//! Request worker thread with bounded release.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::{HOST_TARGET, HostReleaseError, HostStartError};
use crate::cancellation::CancellationSignal;

/// Handle on a spawned worker.
///
/// The worker holds the sending half of a channel for its whole life. The
/// channel disconnects when the worker returns or unwinds, which lets release
/// wait for completion without polling. The worker also fires the
/// cancellation signal on the way out, so a panicking body still lets the
/// lifecycle reach shutdown.
pub(super) struct Worker {
    name: &'static str,
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

impl Worker {
    pub(super) fn spawn<F>(
        name: &'static str,
        cancellation: &CancellationSignal,
        body: F,
    ) -> Result<Self, HostStartError>
    where
        F: FnOnce() + Send + 'static,
    {
        let (finished, done) = mpsc::channel::<()>();
        let exit = ExitGuard {
            name,
            cancellation: cancellation.clone(),
        };
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let _finished = finished;
                let _exit = exit;
                body();
            })
            .map_err(|source| HostStartError::Spawn {
                worker: name,
                source: Arc::new(source),
            })?;
        Ok(Self { name, handle, done })
    }

    /// Joins the worker if it finishes within `grace`; detaches it otherwise.
    ///
    /// A worker blocked on console input cannot be interrupted portably, so
    /// it is left to die with the process.
    pub(super) fn release(self, grace: Duration) -> Result<(), HostReleaseError> {
        match self.done.recv_timeout(grace) {
            Err(RecvTimeoutError::Timeout) => {
                debug!(
                    target: HOST_TARGET,
                    worker = self.name,
                    grace_ms = grace.as_millis(),
                    "worker still blocked on input; detaching"
                );
                Ok(())
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => self
                .handle
                .join()
                .map_err(|_| HostReleaseError::WorkerPanicked { worker: self.name }),
        }
    }
}

/// Fires cancellation when the worker thread ends, including by unwinding.
struct ExitGuard {
    name: &'static str,
    cancellation: CancellationSignal,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            warn!(target: HOST_TARGET, worker = self.name, "worker panicked; shutting down");
        }
        self.cancellation.signal();
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Worker")
            .field("name", &self.name)
            .field("finished", &self.handle.is_finished())
            .finish_non_exhaustive()
    }
}
