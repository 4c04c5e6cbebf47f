//! End-to-end startup scenarios driven through in-memory collaborators.

pub(crate) mod support;

use std::sync::Arc;

use courier_config::{EnvironmentDescriptor, StartupConfiguration, StreamEncoding, TransportMode};
use rstest::rstest;
use serde_json::json;

use self::support::{CountingLoader, MemoryStreams, RecordingReporter, ReporterEvent};
use crate::bootstrap::{StartupDeps, prepare_host, run_with};
use crate::cancellation::CancellationSignal;
use crate::composition::builtins;
use crate::errors::{ConfigurationError, STARTUP_FAILURE_EXIT, StartupError};
use crate::host::RunningHost;
use crate::lifecycle::LifecycleState;

fn config(mode: TransportMode) -> StartupConfiguration {
    StartupConfiguration::new(mode, EnvironmentDescriptor::new("/work/project"))
}

fn deps(
    streams: MemoryStreams,
    loader: CountingLoader,
) -> (StartupDeps<MemoryStreams, CountingLoader>, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::default());
    let deps = StartupDeps {
        streams,
        loader,
        reporter: reporter.clone(),
    };
    (deps, reporter)
}

fn builtin_names() -> Vec<String> {
    builtins::descriptors()
        .iter()
        .map(|module| module.name().to_owned())
        .collect()
}

fn lsp_initialize() -> Vec<u8> {
    let body = serde_json::to_vec(&json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {}
    }))
    .expect("serialise");
    let mut framed = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    framed.extend_from_slice(&body);
    framed
}

// ---------------------------------------------------------------------------
// Plugin isolation and composition order
// ---------------------------------------------------------------------------

#[test]
fn failing_plugin_is_skipped_and_host_runs() {
    let (deps, reporter) = deps(MemoryStreams::default(), CountingLoader::failing(&["B"]));
    let config = config(TransportMode::Stdio).with_plugins(["A", "B", "C"]);

    run_with(&config, &deps, &CancellationSignal::new()).expect("startup succeeds");

    assert_eq!(deps.loader.calls(), ["A", "B", "C"]);
    assert_eq!(reporter.plugin_failures(), ["B"]);
    let mut expected = builtin_names();
    expected.extend(["A".to_owned(), "C".to_owned()]);
    assert_eq!(reporter.composed_modules(), Some(expected));
    assert_eq!(
        reporter.host_states(),
        [
            LifecycleState::Running,
            LifecycleState::ShuttingDown,
            LifecycleState::Stopped
        ]
    );
}

#[test]
fn no_plugins_composes_exactly_the_builtins() {
    let (deps, reporter) = deps(MemoryStreams::default(), CountingLoader::default());

    run_with(&config(TransportMode::Stdio), &deps, &CancellationSignal::new())
        .expect("startup succeeds");

    assert!(deps.loader.calls().is_empty());
    assert_eq!(reporter.composed_modules(), Some(builtin_names()));
}

#[test]
fn lsp_mode_never_loads_plugins() {
    let (deps, reporter) = deps(MemoryStreams::default(), CountingLoader::default());
    let config = config(TransportMode::Lsp).with_plugins(["A", "B"]);

    run_with(&config, &deps, &CancellationSignal::new()).expect("startup succeeds");

    assert!(deps.loader.calls().is_empty());
    assert!(reporter.plugin_failures().is_empty());
    assert_eq!(reporter.composed_modules(), Some(builtin_names()));
    assert_eq!(reporter.host_states().last(), Some(&LifecycleState::Stopped));
}

#[test]
fn plugin_shadows_builtin_key_end_to_end() {
    let streams = MemoryStreams::with_input(
        "{\"Seq\":1,\"Command\":\"/codeformat\"}\n{\"Seq\":2,\"Command\":\"/stopserver\"}\n",
    );
    let output = streams.output();
    let loader = CountingLoader::default().exporting("fastfmt", &["/codeformat"]);
    let (deps, _reporter) = deps(streams, loader);
    let config = config(TransportMode::Stdio).with_plugins(["fastfmt"]);

    run_with(&config, &deps, &CancellationSignal::new()).expect("startup succeeds");

    let lines = output.json_lines();
    let format = lines
        .iter()
        .find(|line| line["Request_seq"] == 1)
        .expect("format request answered");
    assert_eq!(format["Body"]["Module"], "fastfmt");
}

#[test]
fn oversized_lsp_frame_still_reaches_shutdown() {
    let header = format!("Content-Length: {}\r\n\r\n", usize::MAX);
    let streams = MemoryStreams::with_input(header.into_bytes());
    let (deps, reporter) = deps(streams, CountingLoader::default());

    run_with(&config(TransportMode::Lsp), &deps, &CancellationSignal::new())
        .expect("transport closes cleanly");

    assert_eq!(reporter.host_states().last(), Some(&LifecycleState::Stopped));
}

#[test]
fn registration_failure_aborts_before_streams_open() {
    let loader = CountingLoader::default().invalid("broken");
    let (deps, reporter) = deps(MemoryStreams::default(), loader);
    let config = config(TransportMode::Stdio).with_plugins(["broken"]);

    let error = run_with(&config, &deps, &CancellationSignal::new())
        .expect_err("registration failure is fatal");

    assert!(matches!(error, StartupError::Composition { .. }));
    assert_eq!(error.exit_status(), STARTUP_FAILURE_EXIT);
    assert!(deps.streams.opened().is_empty());
    assert!(reporter.host_states().is_empty());
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

#[test]
fn invalid_encoding_fails_before_anything_else() {
    let (deps, reporter) = deps(MemoryStreams::default(), CountingLoader::default());
    let config = config(TransportMode::Stdio)
        .with_encoding("klingon")
        .with_plugins(["A"]);

    let error = run_with(&config, &deps, &CancellationSignal::new())
        .expect_err("unknown encoding is rejected");

    assert!(matches!(
        error,
        StartupError::Configuration(ConfigurationError::InvalidEncoding { .. })
    ));
    assert_ne!(error.exit_status(), 0);
    assert!(deps.streams.opened().is_empty());
    assert!(deps.loader.calls().is_empty());
    let events = reporter.events();
    assert!(!events.iter().any(|event| matches!(
        event,
        ReporterEvent::PluginFailed(_) | ReporterEvent::CompositionBuilt(_)
    )));
    assert!(matches!(events.as_slice(), [ReporterEvent::Starting, ReporterEvent::Failed(_)]));
}

#[rstest]
#[case(None, StreamEncoding::Utf8)]
#[case(Some("utf-16le"), StreamEncoding::Utf16Le)]
#[case(Some("latin1"), StreamEncoding::Latin1)]
fn stdio_opens_streams_with_requested_encoding(
    #[case] requested: Option<&str>,
    #[case] expected: StreamEncoding,
) {
    let (deps, _reporter) = deps(MemoryStreams::default(), CountingLoader::default());
    let mut config = config(TransportMode::Stdio);
    if let Some(name) = requested {
        config = config.with_encoding(name);
    }

    prepare_host(&config, &deps, &CancellationSignal::new()).expect("host prepared");

    assert_eq!(deps.streams.opened(), [expected]);
}

#[test]
fn lsp_overrides_non_utf8_encoding() {
    let (deps, reporter) = deps(MemoryStreams::default(), CountingLoader::default());
    let config = config(TransportMode::Lsp).with_encoding("latin1");

    let host = prepare_host(&config, &deps, &CancellationSignal::new()).expect("host prepared");

    assert!(matches!(host, RunningHost::Lsp(_)));
    assert_eq!(deps.streams.opened(), [StreamEncoding::Utf8]);
    assert!(
        reporter
            .events()
            .contains(&ReporterEvent::EncodingOverridden(StreamEncoding::Latin1))
    );
}

#[test]
fn stream_failure_is_fatal() {
    let (deps, reporter) = deps(MemoryStreams::failing(), CountingLoader::default());

    let error = run_with(&config(TransportMode::Stdio), &deps, &CancellationSignal::new())
        .expect_err("console is unavailable");

    assert!(matches!(error, StartupError::Streams { .. }));
    assert!(reporter.host_states().is_empty());
    assert!(matches!(reporter.events().last(), Some(ReporterEvent::Failed(_))));
}

// ---------------------------------------------------------------------------
// Index origin
// ---------------------------------------------------------------------------

#[rstest]
#[case(true, 0)]
#[case(false, 1)]
fn stdio_index_origin_follows_configuration(#[case] zero_based: bool, #[case] origin: u32) {
    let streams = MemoryStreams::default();
    let output = streams.output();
    let (deps, _reporter) = deps(streams, CountingLoader::default());
    let config = config(TransportMode::Stdio).with_zero_based_indices(zero_based);

    run_with(&config, &deps, &CancellationSignal::new()).expect("startup succeeds");

    let lines = output.json_lines();
    let started = lines.first().expect("started event");
    assert_eq!(started["Body"]["IndexOrigin"], origin);
}

#[test]
fn lsp_forces_zero_based_indices() {
    let streams = MemoryStreams::with_input(lsp_initialize());
    let output = streams.output();
    let (deps, _reporter) = deps(streams, CountingLoader::default());
    let config = config(TransportMode::Lsp).with_zero_based_indices(false);

    run_with(&config, &deps, &CancellationSignal::new()).expect("startup succeeds");

    assert!(output.text().contains(r#""indexOrigin":0"#));
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn prior_cancellation_still_walks_the_full_lifecycle() {
    let (deps, reporter) = deps(MemoryStreams::default(), CountingLoader::default());
    let cancellation = CancellationSignal::new();
    cancellation.signal();

    run_with(&config(TransportMode::Stdio), &deps, &cancellation).expect("startup succeeds");

    assert_eq!(
        reporter.host_states(),
        [
            LifecycleState::Running,
            LifecycleState::ShuttingDown,
            LifecycleState::Stopped
        ]
    );
}
