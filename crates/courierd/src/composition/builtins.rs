//! Built-in service modules shipped with the daemon.

use super::{ModuleDescriptor, ModuleOrigin};

/// Capability key that asks the stdio host to stop.
pub const STOP_SERVER: &str = "/stopserver";

/// Capability key answered with the host's readiness.
pub const CHECK_READINESS: &str = "/checkreadiness";

const BUILTINS: &[(&str, &[&str])] = &[
    ("server", &["/checkalivestatus", CHECK_READINESS, STOP_SERVER]),
    (
        "workspace",
        &["/projects", "/project", "/open", "/close", "/updatebuffer", "/filesChanged"],
    ),
    (
        "navigation",
        &["/gotodefinition", "/findimplementations", "/findusages", "/findsymbols"],
    ),
    ("diagnostics", &["/codecheck", "/diagnostics"]),
    ("formatting", &["/codeformat", "/formatRange", "/formatAfterKeystroke"]),
    ("completion", &["/completion", "/signatureHelp"]),
];

/// Descriptors for the built-in modules, in registration order.
#[must_use]
pub fn descriptors() -> Vec<ModuleDescriptor> {
    BUILTINS
        .iter()
        .map(|(name, capabilities)| ModuleDescriptor {
            name: (*name).to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            origin: ModuleOrigin::BuiltIn,
            capabilities: capabilities.iter().map(|key| (*key).to_owned()).collect(),
        })
        .collect()
}
