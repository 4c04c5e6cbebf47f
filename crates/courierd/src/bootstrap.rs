//! Startup orchestration.
//!
//! The sequence is fixed: select the mode (failing fast on bad input), build
//! the composition, open the console with the resolved encoding, construct
//! the host, then hand it to the lifecycle. Nothing touches the console
//! before the encoding is known.

use std::sync::Arc;

use courier_config::{StartupConfiguration, TransportMode};
use courier_plugins::{ModuleLoader, load_batch};

use crate::cancellation::CancellationSignal;
use crate::composition::{CompositionBuilder, ServiceComposition, builtins};
use crate::errors::StartupError;
use crate::host::{LspHost, RunningHost, StdioHost};
use crate::lifecycle::HostLifecycle;
use crate::mode::{ModePlan, select_mode};
use crate::reporter::{PluginDiagnostics, StartupReporter};
use crate::settings::RuntimeSettings;
use crate::streams::StreamProvider;

/// Collaborators the orchestrator depends on.
pub struct StartupDeps<S, L> {
    /// Source of the console streams.
    pub streams: S,
    /// Resolves plugin identifiers.
    pub loader: L,
    /// Receives startup and lifecycle events.
    pub reporter: Arc<dyn StartupReporter>,
}

/// Builds the host for `config` without starting it.
///
/// # Errors
///
/// Returns [`StartupError`] when configuration is invalid, a plugin fails
/// registration, or the console cannot be opened. Plugin load failures are
/// reported and skipped.
pub fn prepare_host<S, L>(
    config: &StartupConfiguration,
    deps: &StartupDeps<S, L>,
    cancellation: &CancellationSignal,
) -> Result<RunningHost, StartupError>
where
    S: StreamProvider,
    L: ModuleLoader,
{
    let plan = select_mode(config)?;
    deps.reporter.mode_selected(&plan);
    if let Some(requested) = plan.overridden_encoding() {
        deps.reporter.encoding_overridden(requested);
    }

    let composition = Arc::new(compose(config, &plan, deps)?);
    deps.reporter.composition_built(&composition);

    let settings = Arc::new(RuntimeSettings::new(
        plan.mode(),
        plan.flags(),
        config.environment().clone(),
    ));
    let streams = deps
        .streams
        .open(plan.stream_encoding())
        .map_err(StartupError::streams)?;

    let host = match plan.mode() {
        TransportMode::Stdio => RunningHost::Stdio(StdioHost::new(
            streams,
            settings,
            composition,
            cancellation.clone(),
        )),
        TransportMode::Lsp => RunningHost::Lsp(LspHost::new(
            streams,
            settings,
            composition,
            cancellation.clone(),
        )),
    };
    Ok(host)
}

fn compose<S, L>(
    config: &StartupConfiguration,
    plan: &ModePlan,
    deps: &StartupDeps<S, L>,
) -> Result<ServiceComposition, StartupError>
where
    L: ModuleLoader,
{
    let builder = CompositionBuilder::new().with_builtins(builtins::descriptors());
    if !plan.loads_plugins() {
        return Ok(builder.build()?);
    }
    let diagnostics = PluginDiagnostics::new(&*deps.reporter);
    let report = load_batch(&deps.loader, config.plugins(), &diagnostics);
    Ok(builder.with_plugins(report.into_loaded()).build()?)
}

/// Runs the daemon until `cancellation` fires.
///
/// Returns once the host has been released. Every failure is reported
/// through the reporter before it is returned.
///
/// # Errors
///
/// Returns [`StartupError`] when the host could not be prepared or started.
pub fn run_with<S, L>(
    config: &StartupConfiguration,
    deps: &StartupDeps<S, L>,
    cancellation: &CancellationSignal,
) -> Result<(), StartupError>
where
    S: StreamProvider,
    L: ModuleLoader,
{
    deps.reporter.startup_starting(config);

    let result = prepare_host(config, deps, cancellation).and_then(|host| {
        let mut lifecycle = HostLifecycle::new(Arc::clone(&deps.reporter));
        lifecycle.run(host, cancellation).map_err(StartupError::from)
    });
    if let Err(error) = &result {
        deps.reporter.startup_failed(error);
    }
    result
}
