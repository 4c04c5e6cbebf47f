//! Host lifecycle: start, block until cancelled, release.

use std::fmt;
use std::sync::Arc;

use courier_config::TransportMode;

use crate::cancellation::CancellationSignal;
use crate::host::{HostStartError, TransportHost};
use crate::reporter::StartupReporter;

/// States a host moves through. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// Constructed, not yet started.
    NotStarted,
    /// Serving requests.
    Running,
    /// Cancellation observed; releasing resources.
    ShuttingDown,
    /// Resources released.
    Stopped,
}

impl LifecycleState {
    /// Lower-case state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Drives one host from `NotStarted` to `Stopped`.
pub struct HostLifecycle {
    state: LifecycleState,
    reporter: Arc<dyn StartupReporter>,
}

impl HostLifecycle {
    /// Creates a lifecycle reporting transitions to `reporter`.
    #[must_use]
    pub fn new(reporter: Arc<dyn StartupReporter>) -> Self {
        Self {
            state: LifecycleState::NotStarted,
            reporter,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Starts `host`, blocks until `cancellation` fires, then releases it.
    ///
    /// The host is released exactly once on every path, including a failed
    /// start. Release problems are reported but never turn a clean shutdown
    /// into a failure.
    ///
    /// # Errors
    ///
    /// Returns [`HostStartError`] when the host fails to start, or when this
    /// lifecycle has already run a host.
    pub fn run<H>(
        &mut self,
        mut host: H,
        cancellation: &CancellationSignal,
    ) -> Result<(), HostStartError>
    where
        H: TransportHost,
    {
        if self.state != LifecycleState::NotStarted {
            return Err(HostStartError::AlreadyStarted);
        }
        let mode = host.mode();

        if let Err(error) = host.start() {
            self.release(host);
            self.transition(mode, LifecycleState::Stopped);
            return Err(error);
        }
        self.transition(mode, LifecycleState::Running);

        cancellation.wait();

        self.transition(mode, LifecycleState::ShuttingDown);
        self.release(host);
        self.transition(mode, LifecycleState::Stopped);
        Ok(())
    }

    fn release<H: TransportHost>(&self, host: H) {
        if let Err(error) = host.release() {
            self.reporter.host_release_failed(&error);
        }
    }

    fn transition(&mut self, mode: TransportMode, next: LifecycleState) {
        debug_assert!(next > self.state, "lifecycle moves forward only");
        self.state = next;
        self.reporter.host_state_changed(mode, next);
    }
}

impl fmt::Debug for HostLifecycle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HostLifecycle")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
