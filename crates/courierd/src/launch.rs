//! Production entry point wiring the real collaborators.

use std::error::Error;
use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use courier_config::{ConfigError, StartupConfiguration};
use courier_plugins::ManifestLoader;

use crate::bootstrap::{StartupDeps, run_with};
use crate::cancellation::CancellationSignal;
use crate::errors::{ConfigurationError, StartupError};
use crate::process::{HOST_POLL_INTERVAL, HostProcessWatcher, SignalBridge};
use crate::reporter::{StartupReporter, StructuredStartupReporter};
use crate::streams::StdStreamProvider;
use crate::telemetry;

/// Parses `args`, runs the daemon, and maps the outcome to an exit code.
///
/// Exit codes: `0` after a normal shutdown or when help was requested, `2`
/// when the command line is rejected, `1` for any other startup failure.
pub fn run<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = match StartupConfiguration::load_from_iter(args) {
        Ok(config) => config,
        Err(error) => return reject_arguments(error),
    };

    if let Err(source) = telemetry::initialise(config.environment()) {
        let error = StartupError::from(source);
        write_stderr(&error);
        return error.exit_code();
    }

    match launch(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => error.exit_code(),
    }
}

fn launch(config: &StartupConfiguration) -> Result<(), StartupError> {
    let reporter: Arc<dyn StartupReporter> = Arc::new(StructuredStartupReporter::new());
    install_and_run(config, &reporter, &CancellationSignal::new())
}

fn install_and_run(
    config: &StartupConfiguration,
    reporter: &Arc<dyn StartupReporter>,
    cancellation: &CancellationSignal,
) -> Result<(), StartupError> {
    let _signals = SignalBridge::install(cancellation)
        .map_err(|source| fail(reporter.as_ref(), source.into()))?;
    let _host_watch = config
        .environment()
        .host_pid()
        .map(|pid| HostProcessWatcher::spawn(pid, cancellation, HOST_POLL_INTERVAL))
        .transpose()
        .map_err(|source| fail(reporter.as_ref(), source.into()))?;

    let search_paths = config
        .environment()
        .plugin_search_paths()
        .iter()
        .cloned()
        .map(Utf8PathBuf::into_std_path_buf);
    let deps = StartupDeps {
        streams: StdStreamProvider,
        loader: ManifestLoader::new(search_paths),
        reporter: Arc::clone(reporter),
    };
    let result = run_with(config, &deps, cancellation);
    // The watcher only stops once cancellation fires, and it is joined when
    // `_host_watch` drops below.
    cancellation.signal();
    result
}

fn fail(reporter: &dyn StartupReporter, error: StartupError) -> StartupError {
    reporter.startup_failed(&error);
    error
}

fn reject_arguments(error: ConfigError) -> ExitCode {
    if let ConfigError::Arguments(clap_error) = &error {
        // clap routes help to stdout and usage errors to stderr.
        clap_error.print().ok();
        if error.is_informational() {
            return ExitCode::SUCCESS;
        }
    } else {
        write_stderr(&error);
    }
    StartupError::from(ConfigurationError::from(error)).exit_code()
}

fn write_stderr(error: &dyn Error) {
    // Telemetry may not be installed yet, so this bypasses tracing.
    writeln!(io::stderr().lock(), "courierd: {error}").ok();
}
