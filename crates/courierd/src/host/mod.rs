//! Transport hosts that serve the composition over the console streams.
//!
//! A host owns its console streams from construction until release. Starting
//! a host spawns one worker thread that reads requests; the worker fires the
//! cancellation signal when the protocol asks to stop or the input closes.

mod framing;
mod jsonrpc;
mod lsp;
mod stdio;
mod worker;


use std::io;
use std::sync::Arc;
use std::time::Duration;

use courier_config::TransportMode;
use thiserror::Error;

pub use self::framing::FramingError;
pub use self::lsp::LspHost;
pub use self::stdio::StdioHost;

pub(crate) const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// How long release waits for a worker before detaching it.
pub const RELEASE_GRACE: Duration = Duration::from_millis(250);

/// Raised when a host cannot enter its running state.
#[derive(Debug, Clone, Error)]
pub enum HostStartError {
    /// `start` was called on a host that already started.
    #[error("host already started")]
    AlreadyStarted,
    /// The request worker could not be spawned.
    #[error("failed to spawn {worker} worker: {source}")]
    Spawn {
        /// Worker thread name.
        worker: &'static str,
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The initial output could not be written.
    #[error("failed to write to console output: {source}")]
    Output {
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl HostStartError {
    pub(crate) fn output(source: io::Error) -> Self {
        Self::Output {
            source: Arc::new(source),
        }
    }
}

/// Raised while a host releases its resources. Never changes the exit code.
#[derive(Debug, Clone, Error)]
pub enum HostReleaseError {
    /// Buffered output could not be flushed.
    #[error("failed to flush console output: {source}")]
    Output {
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The worker thread panicked.
    #[error("{worker} worker panicked")]
    WorkerPanicked {
        /// Worker thread name.
        worker: &'static str,
    },
}

/// A transport host driven by the lifecycle.
pub trait TransportHost: Send {
    /// Mode this host serves.
    fn mode(&self) -> TransportMode;

    /// Enters the running state. Must be called at most once.
    ///
    /// # Errors
    ///
    /// Returns [`HostStartError`] when the host cannot run.
    fn start(&mut self) -> Result<(), HostStartError>;

    /// Releases the streams and worker. Consumes the host.
    ///
    /// # Errors
    ///
    /// Returns [`HostReleaseError`] when cleanup was incomplete.
    fn release(self) -> Result<(), HostReleaseError>
    where
        Self: Sized;
}

/// The host selected for this process.
#[derive(Debug)]
pub enum RunningHost {
    /// Line-delimited JSON over stdio.
    Stdio(StdioHost),
    /// Language Server Protocol.
    Lsp(LspHost),
}

impl TransportHost for RunningHost {
    fn mode(&self) -> TransportMode {
        match self {
            Self::Stdio(host) => host.mode(),
            Self::Lsp(host) => host.mode(),
        }
    }

    fn start(&mut self) -> Result<(), HostStartError> {
        match self {
            Self::Stdio(host) => host.start(),
            Self::Lsp(host) => host.start(),
        }
    }

    fn release(self) -> Result<(), HostReleaseError> {
        match self {
            Self::Stdio(host) => host.release(),
            Self::Lsp(host) => host.release(),
        }
    }
}

/// Whether a worker keeps reading after handling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}
