//! Transport mode selection and runtime flag resolution.

use courier_config::{StartupConfiguration, StreamEncoding, TransportMode};

use crate::errors::ConfigurationError;
use crate::settings::RuntimeFlags;

/// Outcome of mode selection: everything the orchestrator needs before any
/// stream is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePlan {
    mode: TransportMode,
    requested_encoding: Option<StreamEncoding>,
    flags: RuntimeFlags,
}

impl ModePlan {
    /// Selected transport mode.
    #[must_use]
    pub const fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Encoding named on the command line, if any, after validation.
    #[must_use]
    pub const fn requested_encoding(&self) -> Option<StreamEncoding> {
        self.requested_encoding
    }

    /// Encoding the console streams are opened with.
    ///
    /// LSP framing counts bytes of UTF-8 content, so LSP mode always uses
    /// UTF-8 regardless of the requested encoding.
    #[must_use]
    pub fn stream_encoding(&self) -> StreamEncoding {
        match self.mode {
            TransportMode::Lsp => StreamEncoding::Utf8,
            TransportMode::Stdio => self.requested_encoding.unwrap_or_default(),
        }
    }

    /// Returns the requested encoding when LSP mode overrides it.
    #[must_use]
    pub fn overridden_encoding(&self) -> Option<StreamEncoding> {
        self.requested_encoding
            .filter(|encoding| self.mode == TransportMode::Lsp && !encoding.is_passthrough())
    }

    /// Resolved runtime flags.
    #[must_use]
    pub const fn flags(&self) -> RuntimeFlags {
        self.flags
    }

    /// Whether the configured plugin list is loaded in this mode.
    #[must_use]
    pub const fn loads_plugins(&self) -> bool {
        matches!(self.mode, TransportMode::Stdio)
    }
}

/// Determines transport mode, runtime flags, and stream encoding.
///
/// Encoding validation happens here so an unknown name fails startup before
/// any console stream is touched. LSP mode forces zero-based indices; stdio
/// mode keeps the configured preference.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidEncoding`] when the encoding name is
/// not recognised.
pub fn select_mode(config: &StartupConfiguration) -> Result<ModePlan, ConfigurationError> {
    let requested_encoding = config
        .encoding()
        .map(StreamEncoding::lookup)
        .transpose()
        .map_err(|source| ConfigurationError::InvalidEncoding { source })?;

    let mode = config.mode();
    let zero_based_indices = match mode {
        TransportMode::Lsp => true,
        TransportMode::Stdio => config.zero_based_indices(),
    };

    Ok(ModePlan {
        mode,
        requested_encoding,
        flags: RuntimeFlags::new(zero_based_indices),
    })
}

#[cfg(test)]
mod tests {
    use courier_config::EnvironmentDescriptor;
    use rstest::rstest;

    use super::*;

    fn config(mode: TransportMode) -> StartupConfiguration {
        StartupConfiguration::new(mode, EnvironmentDescriptor::new("/work"))
    }

    #[rstest]
    #[case::stdio_default(TransportMode::Stdio, false, false)]
    #[case::stdio_explicit(TransportMode::Stdio, true, true)]
    #[case::lsp_forces(TransportMode::Lsp, false, true)]
    #[case::lsp_explicit(TransportMode::Lsp, true, true)]
    fn zero_based_follows_mode_and_preference(
        #[case] mode: TransportMode,
        #[case] preference: bool,
        #[case] expected: bool,
    ) {
        let plan = select_mode(&config(mode).with_zero_based_indices(preference))
            .expect("selection succeeds");
        assert_eq!(plan.mode(), mode);
        assert_eq!(plan.flags().zero_based_indices(), expected);
        assert_eq!(plan.flags().index_origin(), u32::from(!expected));
    }

    #[test]
    fn absent_encoding_uses_platform_default() {
        let plan = select_mode(&config(TransportMode::Stdio)).expect("selection succeeds");
        assert_eq!(plan.requested_encoding(), None);
        assert_eq!(plan.stream_encoding(), StreamEncoding::Utf8);
    }

    #[test]
    fn stdio_applies_requested_encoding() {
        let plan = select_mode(&config(TransportMode::Stdio).with_encoding("utf-16le"))
            .expect("selection succeeds");
        assert_eq!(plan.stream_encoding(), StreamEncoding::Utf16Le);
        assert_eq!(plan.overridden_encoding(), None);
    }

    #[test]
    fn lsp_keeps_utf8_and_reports_override() {
        let plan = select_mode(&config(TransportMode::Lsp).with_encoding("latin1"))
            .expect("selection succeeds");
        assert_eq!(plan.stream_encoding(), StreamEncoding::Utf8);
        assert_eq!(plan.overridden_encoding(), Some(StreamEncoding::Latin1));
        assert!(!plan.loads_plugins());
    }

    #[rstest]
    #[case::stdio(TransportMode::Stdio)]
    #[case::lsp(TransportMode::Lsp)]
    fn unknown_encoding_is_rejected_in_every_mode(#[case] mode: TransportMode) {
        let error = select_mode(&config(mode).with_encoding("klingon"))
            .expect_err("selection should fail");
        match error {
            ConfigurationError::InvalidEncoding { source } => assert_eq!(source.name(), "klingon"),
            other => panic!("expected InvalidEncoding, got {other:?}"),
        }
    }
}
