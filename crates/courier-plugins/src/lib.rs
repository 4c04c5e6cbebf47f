//! Plugin discovery and loading for the Courier daemon.
//!
//! Plugins are modules described by JSON manifests. Each manifest names the
//! capability keys the plugin contributes to the daemon's service
//! composition. This crate resolves plugin identifiers (module names or
//! paths) into [`PluginModule`] handles and loads batches of them with
//! per-plugin failure isolation: a plugin that cannot be loaded is reported
//! and skipped, never fatal.
//!
//! Semantic validation of a manifest is deferred to registration, which is
//! owned by the daemon's composition builder.
//!
//! # Example
//!
//! ```rust,no_run
//! use courier_plugins::{ManifestLoader, TracingDiagnostics, load_batch};
//!
//! let loader = ManifestLoader::new(["/usr/share/courier/plugins"]);
//! let requested = vec!["razor".to_owned(), "./local/plugin.json".to_owned()];
//! let report = load_batch(&loader, &requested, &TracingDiagnostics);
//! for module in report.loaded() {
//!     println!("{} from {}", module.identifier(), module.source().display());
//! }
//! ```

pub mod error;
pub mod loader;
pub mod manifest;

#[cfg(test)]
mod tests;

pub use self::error::PluginError;
pub use self::loader::{
    LoadDiagnostics, MANIFEST_FILE, ManifestLoader, ModuleLoader, PluginLoadFailure,
    PluginLoadReport, PluginModule, TracingDiagnostics, load_batch,
};
pub use self::manifest::{PluginManifest, SUPPORTED_SCHEMA};

pub(crate) const LOADER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::loader");
