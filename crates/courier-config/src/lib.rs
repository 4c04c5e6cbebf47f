//! Startup configuration for the Courier daemon.
//!
//! The crate owns the command-line surface of `courierd` and resolves it into
//! an immutable [`StartupConfiguration`]. Parsing is deliberately shallow: the
//! encoding name is carried as text and validated by the daemon's mode
//! selector, which is the component responsible for failing fast before any
//! stream is opened.

mod args;
mod defaults;
mod encoding;
mod environment;
mod error;
mod logging;
mod transport;

use std::env;
use std::ffi::OsString;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

use crate::args::StartupArgs;

pub use defaults::{PROJECT_PLUGIN_DIR, default_plugin_search_paths};
pub use encoding::{StreamEncoding, UnknownEncoding};
pub use environment::EnvironmentDescriptor;
pub use error::ConfigError;
pub use logging::{DEFAULT_LOG_FILTER, LogFormat, VERBOSE_LOG_FILTER};
pub use transport::TransportMode;

/// Immutable configuration produced once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfiguration {
    mode: TransportMode,
    encoding: Option<String>,
    zero_based_indices: bool,
    plugins: Vec<String>,
    environment: EnvironmentDescriptor,
}

impl StartupConfiguration {
    /// Builds a configuration directly, bypassing argument parsing.
    #[must_use]
    pub fn new(mode: TransportMode, environment: EnvironmentDescriptor) -> Self {
        Self {
            mode,
            encoding: None,
            zero_based_indices: false,
            plugins: Vec::new(),
            environment,
        }
    }

    /// Requests an explicit stream encoding by name.
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Sets the explicit zero-based indexing preference.
    #[must_use]
    pub const fn with_zero_based_indices(mut self, zero_based: bool) -> Self {
        self.zero_based_indices = zero_based;
        self
    }

    /// Replaces the ordered plugin identifier list.
    #[must_use]
    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    /// Parses the process arguments relative to the current working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when arguments are rejected or the working
    /// directory cannot be resolved.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cwd = env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            source: Arc::new(source),
        })?;
        let cwd = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|path| ConfigError::NonUtf8Path { path })?;
        Self::load_from_iter_in(args, &cwd)
    }

    /// Parses arguments, resolving relative paths against `cwd`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when arguments are rejected.
    pub fn load_from_iter_in<I, T>(args: I, cwd: &Utf8Path) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = StartupArgs::try_parse_from(args)?;
        Self::from_args(args, cwd)
    }

    fn from_args(args: StartupArgs, cwd: &Utf8Path) -> Result<Self, ConfigError> {
        let options = environment::parse_options(&args.options)?;
        let target_directory = args
            .source
            .map_or_else(|| cwd.to_path_buf(), |source| cwd.join(source));
        let plugin_search_paths = if args.plugin_dirs.is_empty() {
            default_plugin_search_paths(&target_directory)
        } else {
            args.plugin_dirs.iter().map(|dir| cwd.join(dir)).collect()
        };
        let log_filter = logging::effective_filter(args.log_filter, args.verbose);
        let environment = EnvironmentDescriptor::new(target_directory)
            .with_host_pid(args.host_pid)
            .with_log_filter(log_filter)
            .with_log_format(args.log_format)
            .with_plugin_search_paths(plugin_search_paths)
            .with_options(options);
        let mode = if args.lsp {
            TransportMode::Lsp
        } else {
            TransportMode::Stdio
        };
        Ok(Self {
            mode,
            encoding: args.encoding,
            zero_based_indices: args.zero_based_indices,
            plugins: args.plugins,
            environment,
        })
    }

    /// Transport mode requested on the command line.
    #[must_use]
    pub const fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Encoding name as supplied, before validation.
    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Explicit zero-based indexing preference.
    #[must_use]
    pub const fn zero_based_indices(&self) -> bool {
        self.zero_based_indices
    }

    /// Plugin identifiers in request order.
    #[must_use]
    pub fn plugins(&self) -> &[String] {
        self.plugins.as_slice()
    }

    /// Resolved environment descriptor.
    #[must_use]
    pub const fn environment(&self) -> &EnvironmentDescriptor {
        &self.environment
    }
}
