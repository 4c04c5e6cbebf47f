//! Best-effort loading of an ordered batch of plugin identifiers.

use tracing::error;

use crate::LOADER_TARGET;
use crate::error::PluginError;

use super::{ModuleLoader, PluginModule};

/// A plugin that could not be loaded.
#[derive(Debug, Clone)]
pub struct PluginLoadFailure {
    identifier: String,
    error: PluginError,
}

impl PluginLoadFailure {
    /// Records a failure for `identifier`.
    #[must_use]
    pub fn new(identifier: impl Into<String>, error: PluginError) -> Self {
        Self {
            identifier: identifier.into(),
            error,
        }
    }

    /// Identifier exactly as it was requested.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.identifier.as_str()
    }

    /// Underlying load error.
    #[must_use]
    pub const fn error(&self) -> &PluginError {
        &self.error
    }
}

/// Outcome of a batch load.
///
/// `loaded` keeps the request order of the identifiers that succeeded.
#[derive(Debug, Clone, Default)]
pub struct PluginLoadReport {
    loaded: Vec<PluginModule>,
    failures: Vec<PluginLoadFailure>,
}

impl PluginLoadReport {
    /// Modules that loaded, in request order.
    #[must_use]
    pub fn loaded(&self) -> &[PluginModule] {
        &self.loaded
    }

    /// Identifiers that failed, in request order.
    #[must_use]
    pub fn failures(&self) -> &[PluginLoadFailure] {
        &self.failures
    }

    /// Number of identifiers attempted.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.loaded.len() + self.failures.len()
    }

    /// Consumes the report, keeping only the loaded modules.
    #[must_use]
    pub fn into_loaded(self) -> Vec<PluginModule> {
        self.loaded
    }
}

/// Receives one notification per plugin that fails to load.
pub trait LoadDiagnostics {
    /// Called once for each failed identifier, in request order.
    fn plugin_failed(&self, failure: &PluginLoadFailure);
}

/// Diagnostics sink that logs failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl LoadDiagnostics for TracingDiagnostics {
    fn plugin_failed(&self, failure: &PluginLoadFailure) {
        error!(
            target: LOADER_TARGET,
            plugin = failure.identifier(),
            error = %failure.error(),
            "failed to load plugin"
        );
    }
}

/// Attempts every identifier exactly once, in order.
///
/// A failure is recorded, reported to `diagnostics`, and skipped; it never
/// stops the remaining identifiers from loading. Nothing is reported for
/// modules that load successfully.
pub fn load_batch<L>(
    loader: &L,
    identifiers: &[String],
    diagnostics: &dyn LoadDiagnostics,
) -> PluginLoadReport
where
    L: ModuleLoader + ?Sized,
{
    let mut report = PluginLoadReport::default();
    for identifier in identifiers {
        match loader.load(identifier) {
            Ok(module) => report.loaded.push(module),
            Err(error) => {
                let failure = PluginLoadFailure::new(identifier.as_str(), error);
                diagnostics.plugin_failed(&failure);
                report.failures.push(failure);
            }
        }
    }
    report
}
