//! `Content-Length` message framing for the LSP host.
//!
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```

use std::io::{self, BufRead};

use thiserror::Error;

use crate::streams::SharedWriter;

const CONTENT_LENGTH: &str = "content-length";

/// Largest payload accepted from the client.
pub(super) const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Errors raised while reading a framed message.
#[derive(Debug, Error)]
pub enum FramingError {
    /// Reading the console failed or closed mid-message.
    #[error("transport IO error: {0}")]
    Io(#[from] io::Error),
    /// The header block had no `Content-Length`.
    #[error("missing Content-Length header")]
    MissingContentLength,
    /// A header line could not be parsed.
    #[error("invalid header line '{line}'")]
    InvalidHeader {
        /// Offending line, trimmed.
        line: String,
    },
    /// The announced payload exceeds [`MAX_FRAME_LEN`].
    #[error("frame of {length} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Announced `Content-Length`.
        length: usize,
        /// Accepted maximum.
        limit: usize,
    },
}

/// Reads one framed payload.
///
/// Returns `Ok(None)` when the input closes cleanly between messages.
pub(super) fn read_frame<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>, FramingError> {
    let Some(length) = read_headers(reader)? else {
        return Ok(None);
    };
    if length > MAX_FRAME_LEN {
        return Err(FramingError::TooLarge {
            length,
            limit: MAX_FRAME_LEN,
        });
    }
    let mut payload = vec![0_u8; length];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}

fn read_headers<R: BufRead>(reader: &mut R) -> Result<Option<usize>, FramingError> {
    let mut content_length: Option<usize> = None;
    let mut seen_header = false;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            if seen_header {
                return Err(FramingError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed while reading headers",
                )));
            }
            return Ok(None);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            if seen_header {
                break;
            }
            // Stray blank lines between messages.
            continue;
        }
        seen_header = true;

        let Some((name, value)) = trimmed.split_once(':') else {
            return Err(FramingError::InvalidHeader {
                line: trimmed.to_owned(),
            });
        };
        if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            let parsed = value
                .trim()
                .parse()
                .map_err(|_| FramingError::InvalidHeader {
                    line: trimmed.to_owned(),
                })?;
            content_length = Some(parsed);
        }
        // Other headers (Content-Type) are ignored.
    }

    content_length
        .map(Some)
        .ok_or(FramingError::MissingContentLength)
}

/// Writes `payload` as one framed message.
pub(super) fn write_frame(output: &SharedWriter, payload: &[u8]) -> io::Result<()> {
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    output.write_message(&[header.as_bytes(), payload])
}
