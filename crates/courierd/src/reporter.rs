//! Structured reporting for startup and lifecycle events.

use std::sync::Arc;

use courier_config::{StartupConfiguration, StreamEncoding, TransportMode};
use courier_plugins::{LoadDiagnostics, PluginLoadFailure, TracingDiagnostics};

use crate::composition::ServiceComposition;
use crate::errors::StartupError;
use crate::host::HostReleaseError;
use crate::lifecycle::LifecycleState;
use crate::mode::ModePlan;

const REPORTER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::startup");

/// Observer trait used to surface startup events to telemetry sinks.
pub trait StartupReporter: Send + Sync {
    /// Invoked before mode selection begins.
    fn startup_starting(&self, config: &StartupConfiguration);

    /// Invoked once the transport mode and flags are resolved.
    fn mode_selected(&self, plan: &ModePlan);

    /// Invoked when LSP mode ignores a requested non-UTF-8 encoding.
    fn encoding_overridden(&self, requested: StreamEncoding);

    /// Invoked once per plugin that fails to load.
    fn plugin_load_failed(&self, failure: &PluginLoadFailure);

    /// Invoked after the service composition is registered.
    fn composition_built(&self, composition: &ServiceComposition);

    /// Invoked on every host lifecycle transition.
    fn host_state_changed(&self, mode: TransportMode, state: LifecycleState);

    /// Invoked when releasing the host left something behind.
    fn host_release_failed(&self, error: &HostReleaseError);

    /// Invoked when startup aborts.
    fn startup_failed(&self, error: &StartupError);
}

impl<T> StartupReporter for Arc<T>
where
    T: StartupReporter + ?Sized,
{
    fn startup_starting(&self, config: &StartupConfiguration) {
        (**self).startup_starting(config);
    }

    fn mode_selected(&self, plan: &ModePlan) {
        (**self).mode_selected(plan);
    }

    fn encoding_overridden(&self, requested: StreamEncoding) {
        (**self).encoding_overridden(requested);
    }

    fn plugin_load_failed(&self, failure: &PluginLoadFailure) {
        (**self).plugin_load_failed(failure);
    }

    fn composition_built(&self, composition: &ServiceComposition) {
        (**self).composition_built(composition);
    }

    fn host_state_changed(&self, mode: TransportMode, state: LifecycleState) {
        (**self).host_state_changed(mode, state);
    }

    fn host_release_failed(&self, error: &HostReleaseError) {
        (**self).host_release_failed(error);
    }

    fn startup_failed(&self, error: &StartupError) {
        (**self).startup_failed(error);
    }
}

/// Adapts a reporter into the plugin loader's diagnostics sink.
pub struct PluginDiagnostics<'a> {
    reporter: &'a dyn StartupReporter,
}

impl<'a> PluginDiagnostics<'a> {
    /// Forwards load failures to `reporter`.
    #[must_use]
    pub const fn new(reporter: &'a dyn StartupReporter) -> Self {
        Self { reporter }
    }
}

impl LoadDiagnostics for PluginDiagnostics<'_> {
    fn plugin_failed(&self, failure: &PluginLoadFailure) {
        self.reporter.plugin_load_failed(failure);
    }
}

/// Default reporter that records startup events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredStartupReporter;

impl StructuredStartupReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StartupReporter for StructuredStartupReporter {
    fn startup_starting(&self, config: &StartupConfiguration) {
        tracing::info!(
            target: REPORTER_TARGET,
            event = "startup_starting",
            mode = %config.mode(),
            plugins = config.plugins().len(),
            target_directory = %config.environment().target_directory(),
            "starting daemon"
        );
    }

    fn mode_selected(&self, plan: &ModePlan) {
        tracing::info!(
            target: REPORTER_TARGET,
            event = "mode_selected",
            mode = %plan.mode(),
            encoding = %plan.stream_encoding(),
            zero_based_indices = plan.flags().zero_based_indices(),
            "transport mode selected"
        );
    }

    fn encoding_overridden(&self, requested: StreamEncoding) {
        tracing::warn!(
            target: REPORTER_TARGET,
            event = "encoding_overridden",
            requested = %requested,
            applied = %StreamEncoding::Utf8,
            "LSP transport requires UTF-8; requested encoding ignored"
        );
    }

    fn plugin_load_failed(&self, failure: &PluginLoadFailure) {
        TracingDiagnostics.plugin_failed(failure);
    }

    fn composition_built(&self, composition: &ServiceComposition) {
        tracing::info!(
            target: REPORTER_TARGET,
            event = "composition_built",
            modules = composition.len(),
            plugins = composition.plugin_count(),
            "service composition registered"
        );
    }

    fn host_state_changed(&self, mode: TransportMode, state: LifecycleState) {
        tracing::info!(
            target: REPORTER_TARGET,
            event = "host_state_changed",
            mode = %mode,
            state = %state,
            "host lifecycle transition"
        );
    }

    fn host_release_failed(&self, error: &HostReleaseError) {
        tracing::warn!(
            target: REPORTER_TARGET,
            event = "host_release_failed",
            error = %error,
            "host release incomplete"
        );
    }

    fn startup_failed(&self, error: &StartupError) {
        tracing::error!(
            target: REPORTER_TARGET,
            event = "startup_failed",
            error = %error,
            exit_status = error.exit_status(),
            "daemon startup failed"
        );
    }
}
