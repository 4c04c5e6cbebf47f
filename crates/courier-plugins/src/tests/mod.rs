//! Crate-level tests for batch loading.

use std::cell::RefCell;
use std::path::PathBuf;

use mockall::{Sequence, mock};
use rstest::rstest;

use crate::error::PluginError;
use crate::loader::{
    LoadDiagnostics, ModuleLoader, PluginLoadFailure, PluginModule, load_batch,
};
use crate::manifest::PluginManifest;

mock! {
    Loader {}
    impl ModuleLoader for Loader {
        fn load(&self, identifier: &str) -> Result<PluginModule, PluginError>;
    }
}

#[derive(Default)]
struct RecordingDiagnostics {
    failures: RefCell<Vec<String>>,
}

impl RecordingDiagnostics {
    fn identifiers(&self) -> Vec<String> {
        self.failures.borrow().clone()
    }
}

impl LoadDiagnostics for RecordingDiagnostics {
    fn plugin_failed(&self, failure: &PluginLoadFailure) {
        self.failures
            .borrow_mut()
            .push(failure.identifier().to_owned());
    }
}

fn module(identifier: &str) -> PluginModule {
    PluginModule::new(
        identifier,
        PathBuf::from(format!("/plugins/{identifier}.json")),
        PluginManifest::new(identifier, "1.0", vec![format!("/{identifier}")]),
    )
}

/// Loader that fails for identifiers listed in `failing`.
struct ScriptedLoader {
    failing: Vec<String>,
    calls: RefCell<Vec<String>>,
}

impl ModuleLoader for ScriptedLoader {
    fn load(&self, identifier: &str) -> Result<PluginModule, PluginError> {
        self.calls.borrow_mut().push(identifier.to_owned());
        if self.failing.iter().any(|candidate| candidate == identifier) {
            Err(PluginError::NotFound {
                identifier: identifier.to_owned(),
                searched: Vec::new(),
            })
        } else {
            Ok(module(identifier))
        }
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

#[test]
fn middle_failure_does_not_stop_later_plugins() {
    let mut loader = MockLoader::new();
    let mut sequence = Sequence::new();
    loader
        .expect_load()
        .withf(|identifier: &str| identifier == "A")
        .once()
        .in_sequence(&mut sequence)
        .returning(|identifier: &str| Ok(module(identifier)));
    loader
        .expect_load()
        .withf(|identifier: &str| identifier == "B")
        .once()
        .in_sequence(&mut sequence)
        .returning(|_identifier: &str| {
            Err(PluginError::Format {
                path: PathBuf::from("/plugins/B.json"),
                message: "bad".into(),
            })
        });
    loader
        .expect_load()
        .withf(|identifier: &str| identifier == "C")
        .once()
        .in_sequence(&mut sequence)
        .returning(|identifier: &str| Ok(module(identifier)));
    let diagnostics = RecordingDiagnostics::default();

    let report = load_batch(&loader, &ids(&["A", "B", "C"]), &diagnostics);

    let loaded: Vec<&str> = report.loaded().iter().map(PluginModule::identifier).collect();
    assert_eq!(loaded, ["A", "C"]);
    assert_eq!(diagnostics.identifiers(), ["B"]);
    assert_eq!(report.failures().len(), 1);
    assert!(matches!(
        report.failures().first().map(PluginLoadFailure::error),
        Some(PluginError::Format { .. })
    ));
}

#[rstest]
#[case::none_fail(&["a", "b", "c", "d"], &[])]
#[case::all_fail(&["a", "b", "c"], &["a", "b", "c"])]
#[case::first_and_last(&["a", "b", "c", "d"], &["a", "d"])]
#[case::repeated_identifier(&["a", "x", "a"], &["x"])]
#[case::empty(&[], &[])]
fn loaded_count_is_attempts_minus_failures(
    #[case] requested: &[&str],
    #[case] failing: &[&str],
) {
    let loader = ScriptedLoader {
        failing: ids(failing),
        calls: RefCell::new(Vec::new()),
    };
    let diagnostics = RecordingDiagnostics::default();
    let requested = ids(requested);

    let report = load_batch(&loader, &requested, &diagnostics);

    let expected_failures = requested
        .iter()
        .filter(|id| failing.contains(&id.as_str()))
        .count();
    let expected_loaded: Vec<&str> = requested
        .iter()
        .map(String::as_str)
        .filter(|id| !failing.contains(id))
        .collect();
    let loaded: Vec<&str> = report.loaded().iter().map(PluginModule::identifier).collect();

    assert_eq!(*loader.calls.borrow(), requested, "each id attempted once, in order");
    assert_eq!(report.attempts(), requested.len());
    assert_eq!(loaded, expected_loaded);
    assert_eq!(diagnostics.identifiers().len(), expected_failures);
}

#[test]
fn successes_emit_no_diagnostics() {
    let loader = ScriptedLoader {
        failing: Vec::new(),
        calls: RefCell::new(Vec::new()),
    };
    let diagnostics = RecordingDiagnostics::default();

    let report = load_batch(&loader, &ids(&["one", "two"]), &diagnostics);

    assert!(diagnostics.identifiers().is_empty());
    assert_eq!(report.into_loaded().len(), 2);
}
