//! Domain errors raised while loading and validating plugins.
//!
//! I/O errors are wrapped in `Arc` so failures can be cloned into load
//! reports and diagnostics without losing their source chain.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors arising from plugin loading and manifest validation.
#[derive(Debug, Clone, Error)]
pub enum PluginError {
    /// No manifest could be found for the identifier.
    #[error("plugin '{identifier}' not found (searched {} location(s))", .searched.len())]
    NotFound {
        /// Identifier as requested.
        identifier: String,
        /// Candidate manifest paths that were checked, in order.
        searched: Vec<PathBuf>,
    },

    /// The manifest exists but could not be read.
    #[error("failed to read plugin manifest '{}': {source}", .path.display())]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The manifest is not in a format this daemon understands.
    #[error("plugin manifest '{}' has an incompatible format: {message}", .path.display())]
    Format {
        /// Manifest path.
        path: PathBuf,
        /// Description of the mismatch.
        message: String,
    },

    /// A manifest failed validation.
    #[error("manifest error: {message}")]
    Manifest {
        /// Description of the validation failure.
        message: String,
    },
}
