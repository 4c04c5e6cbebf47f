//! Resolution of plugin identifiers into loaded modules.
//!
//! The [`ModuleLoader`] trait is the seam between startup orchestration and
//! the mechanism that turns an identifier into a [`PluginModule`]. The
//! production [`ManifestLoader`] reads JSON manifests from disk; tests inject
//! their own loaders.

mod batch;

use std::fs;
use std::io;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::LOADER_TARGET;
use crate::error::PluginError;
use crate::manifest::{PluginManifest, SUPPORTED_SCHEMA};

pub use self::batch::{
    LoadDiagnostics, PluginLoadFailure, PluginLoadReport, TracingDiagnostics, load_batch,
};

/// File name looked up inside a plugin directory.
pub const MANIFEST_FILE: &str = "plugin.json";

/// A successfully loaded plugin module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginModule {
    identifier: String,
    source: PathBuf,
    manifest: PluginManifest,
}

impl PluginModule {
    /// Wraps a manifest loaded for `identifier` from `source`.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        source: impl Into<PathBuf>,
        manifest: PluginManifest,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            source: source.into(),
            manifest,
        }
    }

    /// Identifier exactly as it was requested.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.identifier.as_str()
    }

    /// Location the module was loaded from.
    #[must_use]
    pub fn source(&self) -> &Path {
        self.source.as_path()
    }

    /// Manifest describing the module.
    #[must_use]
    pub const fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }
}

/// Loads a plugin module by name or path.
pub trait ModuleLoader {
    /// Resolves `identifier` and loads the module it names.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError`] when the module cannot be found, read, or
    /// understood.
    fn load(&self, identifier: &str) -> Result<PluginModule, PluginError>;
}

impl<T> ModuleLoader for &T
where
    T: ModuleLoader + ?Sized,
{
    fn load(&self, identifier: &str) -> Result<PluginModule, PluginError> {
        (**self).load(identifier)
    }
}

/// Loader that reads JSON manifests from the filesystem.
///
/// Identifiers that look like paths are read directly. Anything else is a
/// module name searched for in the configured directories, in order.
#[derive(Debug, Clone, Default)]
pub struct ManifestLoader {
    search_paths: Vec<PathBuf>,
}

impl ManifestLoader {
    /// Builds a loader over the given search directories.
    #[must_use]
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Directories searched for module names.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn resolve(&self, identifier: &str) -> Result<PathBuf, PluginError> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(not_found(identifier, Vec::new()));
        }
        if looks_like_path(trimmed) {
            return resolve_direct(identifier, Path::new(trimmed));
        }

        let mut searched = Vec::with_capacity(self.search_paths.len() * 2);
        for directory in &self.search_paths {
            for candidate in [
                directory.join(format!("{trimmed}.json")),
                directory.join(trimmed).join(MANIFEST_FILE),
            ] {
                if candidate.is_file() {
                    return Ok(candidate);
                }
                searched.push(candidate);
            }
        }
        Err(not_found(identifier, searched))
    }
}

impl ModuleLoader for ManifestLoader {
    fn load(&self, identifier: &str) -> Result<PluginModule, PluginError> {
        let path = self.resolve(identifier)?;
        debug!(
            target: LOADER_TARGET,
            plugin = identifier,
            manifest = %path.display(),
            "resolved plugin manifest"
        );
        let manifest = read_manifest(&path)?;
        Ok(PluginModule::new(identifier, path, manifest))
    }
}

fn looks_like_path(identifier: &str) -> bool {
    identifier.contains('/')
        || identifier.contains(MAIN_SEPARATOR)
        || identifier.ends_with(".json")
        || Path::new(identifier).is_absolute()
}

fn resolve_direct(identifier: &str, path: &Path) -> Result<PathBuf, PluginError> {
    let candidate = if path.is_dir() {
        path.join(MANIFEST_FILE)
    } else {
        path.to_path_buf()
    };
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(not_found(identifier, vec![candidate]))
    }
}

fn read_manifest(path: &Path) -> Result<PluginManifest, PluginError> {
    let text = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    let manifest: PluginManifest =
        serde_json::from_str(&text).map_err(|error| PluginError::Format {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
    if manifest.schema() > SUPPORTED_SCHEMA {
        return Err(PluginError::Format {
            path: path.to_path_buf(),
            message: format!(
                "schema {} is newer than the supported schema {SUPPORTED_SCHEMA}",
                manifest.schema()
            ),
        });
    }
    Ok(manifest)
}

fn io_error(path: &Path, source: io::Error) -> PluginError {
    PluginError::Io {
        path: path.to_path_buf(),
        source: Arc::new(source),
    }
}

fn not_found(identifier: &str, searched: Vec<PathBuf>) -> PluginError {
    PluginError::NotFound {
        identifier: identifier.to_owned(),
        searched,
    }
}
