//! Text encodings accepted for the daemon's standard streams.
//!
//! The table is deliberately small: it covers the encodings editors actually
//! request when they launch the daemon. Lookup is case-insensitive and accepts
//! the common aliases for each entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;
use thiserror::Error;

/// Encoding applied to the daemon's standard input and output.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum StreamEncoding {
    /// UTF-8. Bytes pass through untouched.
    #[default]
    #[strum(serialize = "utf-8", serialize = "utf8", serialize = "unicode-1-1-utf-8")]
    Utf8,
    /// UTF-16, little-endian code units.
    #[strum(
        serialize = "utf-16",
        serialize = "utf-16le",
        serialize = "utf16",
        serialize = "utf16le",
        serialize = "unicode",
        serialize = "ucs-2"
    )]
    Utf16Le,
    /// UTF-16, big-endian code units.
    #[strum(serialize = "utf-16be", serialize = "utf16be", serialize = "unicodefffe")]
    Utf16Be,
    /// ISO-8859-1, one byte per code point up to U+00FF.
    #[strum(
        serialize = "iso-8859-1",
        serialize = "iso8859-1",
        serialize = "latin1",
        serialize = "latin-1",
        serialize = "l1"
    )]
    Latin1,
    /// Seven-bit US-ASCII.
    #[strum(serialize = "us-ascii", serialize = "ascii")]
    Ascii,
}

/// Raised when an encoding name is not present in the encoding table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stream encoding '{name}'")]
pub struct UnknownEncoding {
    name: String,
}

impl UnknownEncoding {
    /// Returns the name that failed to resolve.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl StreamEncoding {
    /// Resolves an encoding by name or alias.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownEncoding`] when the name is empty or not in the table.
    pub fn lookup(name: &str) -> Result<Self, UnknownEncoding> {
        Self::from_str(name.trim()).map_err(|_| UnknownEncoding {
            name: name.to_owned(),
        })
    }

    /// Canonical name of the encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Latin1 => "iso-8859-1",
            Self::Ascii => "us-ascii",
        }
    }

    /// Returns `true` when bytes can be forwarded without transcoding.
    #[must_use]
    pub const fn is_passthrough(self) -> bool {
        matches!(self, Self::Utf8)
    }
}

impl fmt::Display for StreamEncoding {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
