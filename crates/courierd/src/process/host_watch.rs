//! Watches the editor process that launched the daemon.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::kill;
#[cfg(unix)]
use nix::unistd::Pid;
use tracing::{info, warn};

use super::{PROCESS_TARGET, ShutdownError};
use crate::cancellation::CancellationSignal;

/// How often the host process is probed.
pub const HOST_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Fires cancellation when the host process exits.
///
/// The watcher thread ends as soon as cancellation fires from any source, so
/// dropping the watcher after shutdown joins promptly.
#[derive(Debug)]
pub struct HostProcessWatcher {
    pid: u32,
    thread: Option<JoinHandle<()>>,
}

impl HostProcessWatcher {
    /// Starts probing `pid` every `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the pid is out of range or the thread
    /// cannot be spawned.
    pub fn spawn(
        pid: u32,
        cancellation: &CancellationSignal,
        interval: Duration,
    ) -> Result<Self, ShutdownError> {
        let probe = Probe::new(pid)?;
        let cancellation = cancellation.clone();
        let thread = thread::Builder::new()
            .name("courier-host-watch".to_owned())
            .spawn(move || watch(&probe, &cancellation, interval))
            .map_err(|source| ShutdownError::Spawn {
                thread: "courier-host-watch",
                source: Arc::new(source),
            })?;
        Ok(Self {
            pid,
            thread: Some(thread),
        })
    }

    /// Pid being watched.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for HostProcessWatcher {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(target: PROCESS_TARGET, pid = self.pid, "host watcher thread panicked");
            }
        }
    }
}

fn watch(probe: &Probe, cancellation: &CancellationSignal, interval: Duration) {
    while !cancellation.wait_timeout(interval) {
        match probe.is_alive() {
            Some(true) => {}
            Some(false) => {
                info!(target: PROCESS_TARGET, pid = probe.pid, "host process exited");
                cancellation.signal();
                return;
            }
            None => {
                warn!(target: PROCESS_TARGET, pid = probe.pid, "cannot probe host process; stopping watch");
                return;
            }
        }
    }
}

struct Probe {
    pid: u32,
    #[cfg(unix)]
    raw: Pid,
}

impl Probe {
    #[cfg(unix)]
    fn new(pid: u32) -> Result<Self, ShutdownError> {
        let raw = i32::try_from(pid)
            .ok()
            .filter(|raw| *raw > 0)
            .ok_or(ShutdownError::InvalidPid { pid })?;
        Ok(Self {
            pid,
            raw: Pid::from_raw(raw),
        })
    }

    #[cfg(not(unix))]
    fn new(pid: u32) -> Result<Self, ShutdownError> {
        Ok(Self { pid })
    }

    /// `None` when liveness cannot be determined.
    #[cfg(unix)]
    fn is_alive(&self) -> Option<bool> {
        match kill(self.raw, None) {
            Ok(()) | Err(Errno::EPERM) => Some(true),
            Err(Errno::ESRCH) => Some(false),
            Err(_) => None,
        }
    }

    #[cfg(not(unix))]
    fn is_alive(&self) -> Option<bool> {
        None
    }
}
