//! Termination signals forwarded to the cancellation signal.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[cfg(unix)]
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::{Handle, Signals};
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;
use crate::cancellation::CancellationSignal;

/// Errors reported while installing shutdown sources.
#[derive(Debug, Clone, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The listener thread could not be spawned.
    #[error("failed to spawn {thread} thread: {source}")]
    Spawn {
        /// Thread name.
        thread: &'static str,
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The host process id does not fit the platform's pid type.
    #[error("host pid {pid} is out of range")]
    InvalidPid {
        /// Rejected pid.
        pid: u32,
    },
}

/// Forwards termination signals to a [`CancellationSignal`].
///
/// Dropping the bridge closes the signal iterator and joins its thread, so
/// the handlers are gone before the process exits.
#[derive(Debug)]
pub struct SignalBridge {
    #[cfg(unix)]
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalBridge {
    /// Listens for SIGTERM, SIGINT, SIGQUIT, and SIGHUP.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the handlers or listener thread cannot
    /// be installed.
    #[cfg(unix)]
    pub fn install(cancellation: &CancellationSignal) -> Result<Self, ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP]).map_err(|source| {
            ShutdownError::Install {
                source: Arc::new(source),
            }
        })?;
        let handle = signals.handle();
        let cancellation = cancellation.clone();
        let thread = thread::Builder::new()
            .name("courier-signals".to_owned())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    info!(target: PROCESS_TARGET, signal, "shutdown signal received");
                    cancellation.signal();
                }
            })
            .map_err(|source| ShutdownError::Spawn {
                thread: "courier-signals",
                source: Arc::new(source),
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Signal delivery is unavailable; shutdown relies on the other sources.
    ///
    /// # Errors
    ///
    /// Never fails on this platform.
    #[cfg(not(unix))]
    pub fn install(_cancellation: &CancellationSignal) -> Result<Self, ShutdownError> {
        tracing::debug!(target: PROCESS_TARGET, "signal handling unsupported on this platform");
        Ok(Self { thread: None })
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        #[cfg(unix)]
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!(target: PROCESS_TARGET, "signal listener thread panicked");
            }
        }
    }
}
