//! Diagnostic log settings.
//!
//! Diagnostics always go to standard error; these settings only choose how
//! much is written and in what shape.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Filter expression used when none is supplied.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Filter applied when `--verbose` is passed.
pub const VERBOSE_LOG_FILTER: &str = "debug";

/// Shape of each diagnostic line.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per line, for editors that capture stderr.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Picks the effective filter. `--verbose` overrides an explicit filter.
pub(crate) fn effective_filter(filter: String, verbose: bool) -> String {
    if verbose {
        VERBOSE_LOG_FILTER.to_owned()
    } else {
        filter
    }
}
