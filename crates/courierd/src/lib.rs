//! Startup orchestration for the Courier editor tooling daemon.
//!
//! The daemon serves a composition of service modules to an editor over the
//! process's standard streams. Startup follows a fixed sequence:
//!
//! 1. Select the transport mode. Stdio mode speaks the daemon's own
//!    line-delimited JSON packets; LSP mode speaks Language Server Protocol
//!    framing and always reports zero-based positions.
//! 2. Build the service composition. Built-in modules register first, then
//!    plugins in the order they were requested, so a later module's
//!    capability key shadows an earlier one. A plugin that fails to load is
//!    reported and skipped; the daemon still starts.
//! 3. Open the console streams with the resolved encoding.
//! 4. Run the transport host through its lifecycle until a
//!    [`CancellationSignal`] fires, then release it.
//!
//! Runtime settings travel as an explicit [`RuntimeSettings`] value handed to
//! each host. No process-wide mutable state is involved besides the tracing
//! subscriber installed by [`telemetry::initialise`].
//!
//! Every collaborator that touches the outside world sits behind a trait
//! ([`StreamProvider`](streams::StreamProvider),
//! [`ModuleLoader`](courier_plugins::ModuleLoader), [`StartupReporter`]), so
//! [`run_with`] can be driven entirely in memory.

mod bootstrap;
mod cancellation;
pub mod composition;
mod errors;
pub mod host;
mod launch;
mod lifecycle;
mod mode;
mod process;
mod reporter;
mod settings;
pub mod streams;
pub mod telemetry;

pub use bootstrap::{StartupDeps, prepare_host, run_with};
pub use cancellation::CancellationSignal;
pub use errors::{ConfigurationError, STARTUP_FAILURE_EXIT, StartupError, USAGE_EXIT};
pub use launch::run;
pub use lifecycle::{HostLifecycle, LifecycleState};
pub use mode::{ModePlan, select_mode};
pub use process::{HOST_POLL_INTERVAL, HostProcessWatcher, ShutdownError, SignalBridge};
pub use reporter::{PluginDiagnostics, StartupReporter, StructuredStartupReporter};
pub use settings::{RuntimeFlags, RuntimeSettings};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
