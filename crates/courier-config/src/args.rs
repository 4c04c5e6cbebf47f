//! Command-line surface of the `courierd` binary.

use camino::Utf8PathBuf;
use clap::Parser;

use crate::logging::{DEFAULT_LOG_FILTER, LogFormat};

/// Raw arguments accepted by `courierd`, before environment resolution.
#[derive(Parser, Debug, Clone)]
#[command(name = "courierd", version, about = "Editor-facing tooling daemon")]
pub(crate) struct StartupArgs {
    /// Speak the Language Server Protocol instead of the stdio protocol.
    #[arg(long)]
    pub(crate) lsp: bool,
    /// Text encoding applied to standard input and output.
    #[arg(short = 'e', long, value_name = "NAME")]
    pub(crate) encoding: Option<String>,
    /// Report line and column positions starting at zero.
    #[arg(short = 'z', long)]
    pub(crate) zero_based_indices: bool,
    /// Plugin to load, by module name or path. May be repeated.
    #[arg(long = "plugin", value_name = "ID")]
    pub(crate) plugins: Vec<String>,
    /// Directory searched for plugins named by module name. May be repeated.
    #[arg(long = "plugin-dir", value_name = "DIR")]
    pub(crate) plugin_dirs: Vec<Utf8PathBuf>,
    /// Directory the daemon operates on. Defaults to the working directory.
    #[arg(short = 's', long = "source", value_name = "DIR")]
    pub(crate) source: Option<Utf8PathBuf>,
    /// Process id of the launching editor; the daemon exits when it does.
    #[arg(long = "host-pid", value_name = "PID")]
    pub(crate) host_pid: Option<u32>,
    /// Tracing filter expression for diagnostics written to stderr.
    #[arg(long, value_name = "EXPR", default_value = DEFAULT_LOG_FILTER)]
    pub(crate) log_filter: String,
    /// Diagnostic output format.
    #[arg(long, value_name = "FORMAT", default_value_t = LogFormat::Json)]
    pub(crate) log_format: LogFormat,
    /// Shorthand for `--log-filter debug`.
    #[arg(short, long)]
    pub(crate) verbose: bool,
    /// Additional `KEY=VALUE` options forwarded to services.
    #[arg(value_name = "KEY=VALUE")]
    pub(crate) options: Vec<String>,
}
