//! Runtime settings resolved once at startup and shared read-only.

use courier_config::{EnvironmentDescriptor, TransportMode};

/// Behaviour flags resolved by the mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeFlags {
    zero_based_indices: bool,
}

impl RuntimeFlags {
    /// Builds the flag set.
    #[must_use]
    pub const fn new(zero_based_indices: bool) -> Self {
        Self { zero_based_indices }
    }

    /// Whether line and column positions start at zero.
    #[must_use]
    pub const fn zero_based_indices(self) -> bool {
        self.zero_based_indices
    }

    /// First line or column number reported to the client.
    #[must_use]
    pub const fn index_origin(self) -> u32 {
        if self.zero_based_indices { 0 } else { 1 }
    }
}

/// Immutable settings injected into every host.
///
/// Hosts receive this behind an `Arc` at construction, so every component
/// that needs index-origin semantics sees the value resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    mode: TransportMode,
    flags: RuntimeFlags,
    environment: EnvironmentDescriptor,
}

impl RuntimeSettings {
    /// Bundles the resolved mode, flags, and environment.
    #[must_use]
    pub const fn new(
        mode: TransportMode,
        flags: RuntimeFlags,
        environment: EnvironmentDescriptor,
    ) -> Self {
        Self {
            mode,
            flags,
            environment,
        }
    }

    /// Selected transport mode.
    #[must_use]
    pub const fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Resolved behaviour flags.
    #[must_use]
    pub const fn flags(&self) -> RuntimeFlags {
        self.flags
    }

    /// Environment the daemon operates in.
    #[must_use]
    pub const fn environment(&self) -> &EnvironmentDescriptor {
        &self.environment
    }
}
