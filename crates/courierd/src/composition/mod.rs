//! Service composition built from built-in modules and loaded plugins.
//!
//! Registration order is significant. Built-ins are registered first, then
//! plugins in request order. When two modules export the same capability key,
//! the one registered later shadows the earlier one.

pub mod builtins;


use std::collections::HashMap;
use std::path::PathBuf;

use courier_plugins::{PluginError, PluginModule};
use thiserror::Error;
use tracing::debug;

const COMPOSITION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::composition");

/// Where a registered module came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOrigin {
    /// Shipped with the daemon.
    BuiltIn,
    /// Loaded from a plugin manifest.
    Plugin {
        /// Identifier the plugin was requested by.
        identifier: String,
        /// Manifest file the plugin was read from.
        source: PathBuf,
    },
}

/// A module registered in the composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    name: String,
    version: String,
    origin: ModuleOrigin,
    capabilities: Vec<String>,
}

impl ModuleDescriptor {
    /// Module name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Module version.
    #[must_use]
    pub const fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Module origin.
    #[must_use]
    pub const fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    /// Returns `true` for plugin modules.
    #[must_use]
    pub const fn is_plugin(&self) -> bool {
        matches!(self.origin, ModuleOrigin::Plugin { .. })
    }

    /// Capability keys the module exports, in declaration order.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }
}

/// Raised when a loaded module is rejected at registration.
///
/// Unlike load failures, registration failures abort startup.
#[derive(Debug, Clone, Error)]
pub enum CompositionError {
    /// A plugin's manifest failed semantic validation.
    #[error("plugin '{identifier}' failed registration: {source}")]
    Registration {
        /// Identifier of the rejected plugin.
        identifier: String,
        /// Validation failure.
        #[source]
        source: PluginError,
    },
}

/// Immutable, ordered set of registered modules.
#[derive(Debug, Clone, Default)]
pub struct ServiceComposition {
    modules: Vec<ModuleDescriptor>,
    index: HashMap<String, usize>,
}

impl ServiceComposition {
    /// Registered modules in registration order.
    #[must_use]
    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Number of registered plugin modules.
    #[must_use]
    pub fn plugin_count(&self) -> usize {
        self.modules.iter().filter(|module| module.is_plugin()).count()
    }

    /// Module that answers `key`: the last one registered to export it.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&ModuleDescriptor> {
        self.index
            .get(key)
            .and_then(|position| self.modules.get(*position))
    }

    /// Returns `true` when some module exports `key`.
    #[must_use]
    pub fn provides(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Every exported capability key, sorted.
    #[must_use]
    pub fn capability_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.index.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Builds a [`ServiceComposition`] in registration order.
#[derive(Debug, Default)]
pub struct CompositionBuilder {
    builtins: Vec<ModuleDescriptor>,
    plugins: Vec<PluginModule>,
}

impl CompositionBuilder {
    /// Starts an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends built-in modules. They always register before plugins.
    #[must_use]
    pub fn with_builtins<I>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        self.builtins.extend(modules);
        self
    }

    /// Appends loaded plugins, preserving their order.
    #[must_use]
    pub fn with_plugins<I>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = PluginModule>,
    {
        self.plugins.extend(modules);
        self
    }

    /// Registers every module and produces the composition.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::Registration`] for the first plugin whose
    /// manifest fails validation.
    pub fn build(self) -> Result<ServiceComposition, CompositionError> {
        let plugins = self
            .plugins
            .iter()
            .map(register)
            .collect::<Result<Vec<_>, _>>()?;

        let mut composition = ServiceComposition::default();
        for module in self.builtins.into_iter().chain(plugins) {
            let position = composition.modules.len();
            for key in &module.capabilities {
                if let Some(previous) = composition.index.insert(key.clone(), position) {
                    debug!(
                        target: COMPOSITION_TARGET,
                        capability = %key,
                        module = module.name(),
                        shadowed = composition.modules.get(previous).map(ModuleDescriptor::name),
                        "capability shadowed"
                    );
                }
            }
            composition.modules.push(module);
        }
        Ok(composition)
    }
}

fn register(module: &PluginModule) -> Result<ModuleDescriptor, CompositionError> {
    let manifest = module.manifest();
    manifest
        .validate()
        .map_err(|source| CompositionError::Registration {
            identifier: module.identifier().to_owned(),
            source,
        })?;
    Ok(ModuleDescriptor {
        name: manifest.name().to_owned(),
        version: manifest.version().to_owned(),
        origin: ModuleOrigin::Plugin {
            identifier: module.identifier().to_owned(),
            source: module.source().to_path_buf(),
        },
        capabilities: manifest.capabilities().to_vec(),
    })
}
