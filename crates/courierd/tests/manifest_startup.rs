//! Startup from real command-line arguments and plugin manifests on disk.

use std::fs;
use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};
use courier_config::{StartupConfiguration, StreamEncoding};
use courier_plugins::ManifestLoader;
use courierd::streams::{ConsoleStreams, StreamProvider};
use courierd::{CancellationSignal, StartupDeps, StartupError, StructuredStartupReporter, run_with};
use rstest::{fixture, rstest};
use serde_json::Value;
use tempfile::TempDir;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn json_lines(&self) -> Vec<Value> {
        let bytes = self.0.lock().expect("output lock").clone();
        String::from_utf8(bytes)
            .expect("UTF-8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("JSON line"))
            .collect()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("output lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct ScriptedConsole {
    input: &'static str,
    output: Captured,
}

impl StreamProvider for ScriptedConsole {
    fn open(&self, encoding: StreamEncoding) -> io::Result<ConsoleStreams> {
        Ok(ConsoleStreams::new(
            Cursor::new(self.input.as_bytes().to_vec()),
            self.output.clone(),
            encoding,
        ))
    }
}

#[fixture]
fn plugin_dir() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    fs::write(
        dir.path().join("fastfmt.json"),
        r#"{"name":"fastfmt","version":"3.1.0","capabilities":["/codeformat","/fastfmt/stats"]}"#,
    )
    .expect("write manifest");
    dir
}

fn utf8(dir: &TempDir) -> Utf8PathBuf {
    Utf8Path::from_path(dir.path())
        .expect("UTF-8 temp path")
        .to_path_buf()
}

fn loader_for(config: &StartupConfiguration) -> ManifestLoader {
    ManifestLoader::new(
        config
            .environment()
            .plugin_search_paths()
            .iter()
            .map(|path| path.as_std_path().to_path_buf()),
    )
}

#[rstest]
fn plugin_from_disk_shadows_builtin_and_missing_plugin_is_skipped(plugin_dir: TempDir) {
    let dir = utf8(&plugin_dir);
    let config = StartupConfiguration::load_from_iter_in(
        [
            "courierd",
            "--plugin",
            "ghost",
            "--plugin",
            "fastfmt",
            "--plugin-dir",
            dir.as_str(),
        ],
        &dir,
    )
    .expect("arguments parse");
    let output = Captured::default();
    let deps = StartupDeps {
        streams: ScriptedConsole {
            input: "{\"Seq\":1,\"Command\":\"/codeformat\"}\n{\"Seq\":2,\"Command\":\"/stopserver\"}\n",
            output: output.clone(),
        },
        loader: loader_for(&config),
        reporter: Arc::new(StructuredStartupReporter::new()),
    };

    run_with(&config, &deps, &CancellationSignal::new()).expect("startup succeeds");

    let lines = output.json_lines();
    assert_eq!(lines.len(), 3, "started event and two responses: {lines:?}");
    let format = lines.get(1).expect("format response");
    assert_eq!(format["Request_seq"], 1);
    assert_eq!(format["Body"]["Module"], "fastfmt");
    assert_eq!(format["Body"]["Version"], "3.1.0");
    let stop = lines.get(2).expect("stop response");
    assert_eq!(stop["Running"], false);
}

#[rstest]
fn unknown_encoding_from_arguments_exits_non_zero(plugin_dir: TempDir) {
    let dir = utf8(&plugin_dir);
    let config = StartupConfiguration::load_from_iter_in(
        ["courierd", "--encoding", "ebcdic", "--plugin", "fastfmt"],
        &dir,
    )
    .expect("arguments parse");
    let output = Captured::default();
    let deps = StartupDeps {
        streams: ScriptedConsole {
            input: "",
            output: output.clone(),
        },
        loader: loader_for(&config),
        reporter: Arc::new(StructuredStartupReporter::new()),
    };

    let error = run_with(&config, &deps, &CancellationSignal::new())
        .expect_err("encoding is rejected");

    assert!(matches!(error, StartupError::Configuration(_)));
    assert_eq!(error.exit_status(), courierd::STARTUP_FAILURE_EXIT);
    assert!(output.json_lines().is_empty());
}

#[test]
fn malformed_option_is_a_usage_error() {
    let error = StartupConfiguration::load_from_iter_in(["courierd", "novalue"], Utf8Path::new("/"))
        .expect_err("option lacks '='");
    let startup = StartupError::from(courierd::ConfigurationError::from(error));
    assert_eq!(startup.exit_status(), courierd::USAGE_EXIT);
}
