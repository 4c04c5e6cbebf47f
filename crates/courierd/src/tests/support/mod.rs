//! Test doubles shared by the daemon's unit tests.

mod loader;
mod reporter;
mod streams;

use std::sync::Arc;

use courier_config::{EnvironmentDescriptor, TransportMode};

use crate::composition::{CompositionBuilder, ServiceComposition, builtins};
use crate::settings::{RuntimeFlags, RuntimeSettings};

pub(crate) use self::loader::{CountingLoader, manifest_module};
pub(crate) use self::reporter::{RecordingReporter, ReporterEvent};
pub(crate) use self::streams::{CapturedOutput, MemoryStreams};

pub(crate) fn settings(mode: TransportMode, zero_based: bool) -> Arc<RuntimeSettings> {
    Arc::new(RuntimeSettings::new(
        mode,
        RuntimeFlags::new(zero_based),
        EnvironmentDescriptor::new("/work/project"),
    ))
}

pub(crate) fn builtin_composition() -> Arc<ServiceComposition> {
    Arc::new(
        CompositionBuilder::new()
            .with_builtins(builtins::descriptors())
            .build()
            .expect("built-ins register"),
    )
}
