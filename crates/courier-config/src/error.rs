use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while turning command-line arguments into configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Argument parsing failed, or help/version output was requested.
    #[error(transparent)]
    Arguments(#[from] clap::Error),
    /// The working directory could not be read.
    #[error("failed to read the working directory: {source}")]
    WorkingDirectory {
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
    /// A directory path was not valid UTF-8.
    #[error("path '{}' is not valid UTF-8", .path.display())]
    NonUtf8Path {
        /// Offending path.
        path: PathBuf,
    },
    /// A trailing option did not have the `KEY=VALUE` shape.
    #[error("malformed option '{argument}': expected KEY=VALUE")]
    MalformedOption {
        /// Argument as supplied.
        argument: String,
    },
}

impl ConfigError {
    /// Returns `true` when clap asked to print help or version output.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::Arguments(error)
                if matches!(
                    error.kind(),
                    clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
                )
        )
    }
}
