//! Scripted module loaders.

use std::path::PathBuf;
use std::sync::Mutex;

use courier_plugins::{ModuleLoader, PluginError, PluginManifest, PluginModule};

pub(crate) fn manifest_module(identifier: &str, capabilities: &[&str]) -> PluginModule {
    PluginModule::new(
        identifier,
        PathBuf::from(format!("/plugins/{identifier}.json")),
        PluginManifest::new(
            identifier,
            "1.0.0",
            capabilities.iter().map(|key| (*key).to_owned()).collect(),
        ),
    )
}

/// Loader that counts calls and fails for the listed identifiers.
///
/// Successful loads export `/<identifier>` plus any extra keys configured
/// with [`CountingLoader::exporting`].
#[derive(Default)]
pub(crate) struct CountingLoader {
    failing: Vec<String>,
    extra: Vec<(String, Vec<String>)>,
    invalid: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl CountingLoader {
    pub(crate) fn failing(identifiers: &[&str]) -> Self {
        Self {
            failing: identifiers.iter().map(|id| (*id).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn exporting(mut self, identifier: &str, keys: &[&str]) -> Self {
        self.extra.push((
            identifier.to_owned(),
            keys.iter().map(|key| (*key).to_owned()).collect(),
        ));
        self
    }

    /// Loads `identifier` with a manifest that fails registration.
    pub(crate) fn invalid(mut self, identifier: &str) -> Self {
        self.invalid.push(identifier.to_owned());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl ModuleLoader for CountingLoader {
    fn load(&self, identifier: &str) -> Result<PluginModule, PluginError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(identifier.to_owned());
        if self.failing.iter().any(|id| id == identifier) {
            return Err(PluginError::NotFound {
                identifier: identifier.to_owned(),
                searched: vec![PathBuf::from(format!("/plugins/{identifier}.json"))],
            });
        }
        if self.invalid.iter().any(|id| id == identifier) {
            return Ok(manifest_module(identifier, &[]));
        }
        let own_key = format!("/{identifier}");
        let mut keys = vec![own_key.as_str()];
        if let Some((_, extra)) = self.extra.iter().find(|(id, _)| id == identifier) {
            keys.extend(extra.iter().map(String::as_str));
        }
        Ok(manifest_module(identifier, &keys))
    }
}
