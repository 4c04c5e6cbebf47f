//! Plugin manifest types describing plugin identity and capabilities.
//!
//! A [`PluginManifest`] is the on-disk description of a plugin module: its
//! name, version, the capability keys it provides to the service composition,
//! and an optional executable. Deserialisation only checks shape; semantic
//! validation happens when the module is registered into a composition.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// Highest manifest schema revision this crate understands.
pub const SUPPORTED_SCHEMA: u32 = 1;

/// Declarative description of a plugin module.
///
/// # Example
///
/// ```
/// use courier_plugins::PluginManifest;
///
/// let manifest = PluginManifest::new("razor", "1.0.0", vec!["/razor/format".into()]);
/// assert_eq!(manifest.name(), "razor");
/// assert!(manifest.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    #[serde(default = "default_schema")]
    schema: u32,
    name: String,
    version: String,
    capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    executable: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<String>,
}

const fn default_schema() -> u32 {
    SUPPORTED_SCHEMA
}

impl PluginManifest {
    /// Creates an in-process manifest with no executable.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        capabilities: Vec<String>,
    ) -> Self {
        Self {
            schema: SUPPORTED_SCHEMA,
            name: name.into(),
            version: version.into(),
            capabilities,
            executable: None,
            args: Vec::new(),
        }
    }

    /// Declares an executable backing the plugin.
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    /// Default arguments passed to the executable.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Validates the manifest, returning an error if it is malformed.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Manifest`] if the name is empty, no capability
    /// is declared, a capability key is blank or repeated, or the executable
    /// path is not absolute.
    pub fn validate(&self) -> Result<(), PluginError> {
        if self.name.trim().is_empty() {
            return Err(manifest_error("plugin name must not be empty"));
        }
        if self.capabilities.is_empty() {
            return Err(manifest_error(format!(
                "plugin '{}' must declare at least one capability",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for key in &self.capabilities {
            if key.trim().is_empty() {
                return Err(manifest_error(format!(
                    "plugin '{}' declares a blank capability key",
                    self.name
                )));
            }
            if !seen.insert(key.as_str()) {
                return Err(manifest_error(format!(
                    "plugin '{}' declares capability '{key}' more than once",
                    self.name
                )));
            }
        }
        if let Some(executable) = &self.executable {
            if !executable.is_absolute() {
                return Err(manifest_error(format!(
                    "plugin executable must be an absolute path, got '{}'",
                    executable.display()
                )));
            }
        }
        Ok(())
    }

    /// Manifest schema revision.
    #[must_use]
    pub const fn schema(&self) -> u32 {
        self.schema
    }

    /// Returns the plugin name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the plugin version.
    #[must_use]
    pub const fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Capability keys provided by the plugin, in declaration order.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Returns the executable backing the plugin, if any.
    #[must_use]
    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    /// Returns the default arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

fn manifest_error(message: impl Into<String>) -> PluginError {
    PluginError::Manifest {
        message: message.into(),
    }
}
