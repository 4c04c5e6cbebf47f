//! Error taxonomy for daemon startup.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use courier_config::{ConfigError, UnknownEncoding};
use thiserror::Error;

use crate::composition::CompositionError;
use crate::host::HostStartError;
use crate::process::ShutdownError;
use crate::telemetry::TelemetryError;

/// Exit code used when startup fails after arguments were accepted.
pub const STARTUP_FAILURE_EXIT: u8 = 1;

/// Exit code used when the command line itself is rejected.
pub const USAGE_EXIT: u8 = 2;

/// Invalid startup input detected before any stream is opened.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Command-line arguments were rejected.
    #[error(transparent)]
    Arguments(#[from] ConfigError),
    /// The requested stream encoding is not recognised.
    #[error("invalid encoding: {source}")]
    InvalidEncoding {
        /// Lookup failure naming the rejected encoding.
        #[source]
        source: UnknownEncoding,
    },
}

/// Fatal errors that abort startup.
///
/// Individual plugin load failures never appear here; they are isolated and
/// reported through the startup reporter instead.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration was invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Telemetry could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Shutdown sources could not be installed.
    #[error("failed to install shutdown handling: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// Console streams could not be opened.
    #[error("failed to open console streams: {source}")]
    Streams {
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
    /// A loaded module failed registration.
    #[error("failed to build service composition: {source}")]
    Composition {
        /// Underlying composition error.
        #[source]
        source: CompositionError,
    },
    /// The transport host failed to start.
    #[error("failed to start transport host: {source}")]
    HostStart {
        /// Underlying host error.
        #[source]
        source: HostStartError,
    },
}

impl From<CompositionError> for StartupError {
    fn from(source: CompositionError) -> Self {
        Self::Composition { source }
    }
}

impl From<HostStartError> for StartupError {
    fn from(source: HostStartError) -> Self {
        Self::HostStart { source }
    }
}

impl From<TelemetryError> for StartupError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<ShutdownError> for StartupError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}

impl StartupError {
    /// Wraps a stream-opening failure.
    #[must_use]
    pub fn streams(source: io::Error) -> Self {
        Self::Streams {
            source: Arc::new(source),
        }
    }

    /// Numeric exit status for this failure. Always non-zero.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Configuration(ConfigurationError::Arguments(
                ConfigError::Arguments(_) | ConfigError::MalformedOption { .. },
            )) => USAGE_EXIT,
            _ => STARTUP_FAILURE_EXIT,
        }
    }

    /// Process exit code for this failure.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}
