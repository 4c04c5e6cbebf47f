use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Wire protocol spoken with the editor for the lifetime of the process.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TransportMode {
    /// Newline-delimited JSON envelopes over text streams.
    #[default]
    Stdio,
    /// Language Server Protocol framing over byte streams.
    Lsp,
}
