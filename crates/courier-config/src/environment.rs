//! Resolved description of the environment the daemon operates in.

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::ConfigError;
use crate::logging::LogFormat;

/// Environment settings derived from the command line and the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDescriptor {
    target_directory: Utf8PathBuf,
    host_pid: Option<u32>,
    log_filter: String,
    log_format: LogFormat,
    plugin_search_paths: Vec<Utf8PathBuf>,
    options: Vec<(String, String)>,
}

impl EnvironmentDescriptor {
    /// Builds a descriptor rooted at `target_directory` with default settings.
    #[must_use]
    pub fn new(target_directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            target_directory: target_directory.into(),
            host_pid: None,
            log_filter: crate::logging::DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
            plugin_search_paths: Vec::new(),
            options: Vec::new(),
        }
    }

    /// Sets the host process id to watch.
    #[must_use]
    pub const fn with_host_pid(mut self, host_pid: Option<u32>) -> Self {
        self.host_pid = host_pid;
        self
    }

    /// Overrides the log filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Overrides the log format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Replaces the plugin search directories.
    #[must_use]
    pub fn with_plugin_search_paths(mut self, paths: Vec<Utf8PathBuf>) -> Self {
        self.plugin_search_paths = paths;
        self
    }

    /// Replaces the additional `KEY=VALUE` options.
    #[must_use]
    pub fn with_options(mut self, options: Vec<(String, String)>) -> Self {
        self.options = options;
        self
    }

    /// Directory the daemon operates on.
    #[must_use]
    pub fn target_directory(&self) -> &Utf8Path {
        self.target_directory.as_path()
    }

    /// Process id of the launching editor, when supplied.
    #[must_use]
    pub const fn host_pid(&self) -> Option<u32> {
        self.host_pid
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Diagnostic output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Directories searched for plugins requested by module name, in order.
    #[must_use]
    pub fn plugin_search_paths(&self) -> &[Utf8PathBuf] {
        self.plugin_search_paths.as_slice()
    }

    /// Additional options in the order they were supplied.
    #[must_use]
    pub fn options(&self) -> &[(String, String)] {
        self.options.as_slice()
    }

    /// Looks up an additional option. The last occurrence of a key wins.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Splits `KEY=VALUE` arguments, rejecting entries without a key or separator.
pub(crate) fn parse_options(raw: &[String]) -> Result<Vec<(String, String)>, ConfigError> {
    raw.iter()
        .map(|argument| match argument.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_owned(), value.to_owned()))
            }
            _ => Err(ConfigError::MalformedOption {
                argument: argument.clone(),
            }),
        })
        .collect()
}
