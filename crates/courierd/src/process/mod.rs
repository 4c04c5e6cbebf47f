//! Process-level shutdown sources feeding the cancellation signal.

mod host_watch;
mod shutdown;

pub use self::host_watch::{HOST_POLL_INTERVAL, HostProcessWatcher};
pub use self::shutdown::{ShutdownError, SignalBridge};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
