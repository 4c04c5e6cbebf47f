//! Reporter double that records every event.

use std::sync::Mutex;

use courier_config::{StartupConfiguration, StreamEncoding, TransportMode};
use courier_plugins::PluginLoadFailure;

use crate::composition::ServiceComposition;
use crate::errors::StartupError;
use crate::host::HostReleaseError;
use crate::lifecycle::LifecycleState;
use crate::mode::ModePlan;
use crate::reporter::StartupReporter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReporterEvent {
    Starting,
    ModeSelected(TransportMode),
    EncodingOverridden(StreamEncoding),
    PluginFailed(String),
    CompositionBuilt(Vec<String>),
    HostState(TransportMode, LifecycleState),
    ReleaseFailed,
    Failed(String),
}

#[derive(Default)]
pub(crate) struct RecordingReporter {
    events: Mutex<Vec<ReporterEvent>>,
}

impl RecordingReporter {
    pub(crate) fn events(&self) -> Vec<ReporterEvent> {
        self.events.lock().expect("events lock").clone()
    }

    pub(crate) fn plugin_failures(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReporterEvent::PluginFailed(identifier) => Some(identifier),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn composed_modules(&self) -> Option<Vec<String>> {
        self.events().into_iter().find_map(|event| match event {
            ReporterEvent::CompositionBuilt(modules) => Some(modules),
            _ => None,
        })
    }

    pub(crate) fn host_states(&self) -> Vec<LifecycleState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReporterEvent::HostState(_, state) => Some(state),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ReporterEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl StartupReporter for RecordingReporter {
    fn startup_starting(&self, _config: &StartupConfiguration) {
        self.push(ReporterEvent::Starting);
    }

    fn mode_selected(&self, plan: &ModePlan) {
        self.push(ReporterEvent::ModeSelected(plan.mode()));
    }

    fn encoding_overridden(&self, requested: StreamEncoding) {
        self.push(ReporterEvent::EncodingOverridden(requested));
    }

    fn plugin_load_failed(&self, failure: &PluginLoadFailure) {
        self.push(ReporterEvent::PluginFailed(failure.identifier().to_owned()));
    }

    fn composition_built(&self, composition: &ServiceComposition) {
        let modules = composition
            .modules()
            .iter()
            .map(|module| module.name().to_owned())
            .collect();
        self.push(ReporterEvent::CompositionBuilt(modules));
    }

    fn host_state_changed(&self, mode: TransportMode, state: LifecycleState) {
        self.push(ReporterEvent::HostState(mode, state));
    }

    fn host_release_failed(&self, _error: &HostReleaseError) {
        self.push(ReporterEvent::ReleaseFailed);
    }

    fn startup_failed(&self, error: &StartupError) {
        self.push(ReporterEvent::Failed(error.to_string()));
    }
}
