//! Transcoding adapters between the wire encoding and UTF-8.
//!
//! Hosts always see UTF-8. [`DecodingReader`] turns wire bytes into UTF-8 and
//! [`EncodingWriter`] turns UTF-8 into wire bytes. Both forward untouched when
//! the wire encoding is UTF-8.

use std::char::REPLACEMENT_CHARACTER;
use std::io::{self, Read, Write};
use std::str;

use courier_config::StreamEncoding;

const CHUNK: usize = 4096;
const UNMAPPABLE: u8 = b'?';

/// Reader yielding UTF-8 decoded from `encoding`.
///
/// Malformed input decodes to U+FFFD. Incomplete sequences are held until
/// the next read completes them; an incomplete tail at end of input decodes
/// to a single U+FFFD.
#[derive(Debug)]
pub struct DecodingReader<R> {
    inner: R,
    encoding: StreamEncoding,
    carry: Vec<u8>,
    pending: Vec<u8>,
    eof: bool,
}

impl<R: Read> DecodingReader<R> {
    /// Wraps `inner`, decoding from `encoding`.
    pub const fn new(inner: R, encoding: StreamEncoding) -> Self {
        Self {
            inner,
            encoding,
            carry: Vec::new(),
            pending: Vec::new(),
            eof: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0_u8; CHUNK];
        let read = self.inner.read(&mut chunk)?;
        if read == 0 {
            self.eof = true;
            if !self.carry.is_empty() {
                self.carry.clear();
                push_char(&mut self.pending, REPLACEMENT_CHARACTER);
            }
            return Ok(());
        }
        self.carry.extend_from_slice(chunk.get(..read).unwrap_or_default());
        let consumed = decode(self.encoding, &self.carry, &mut self.pending);
        self.carry.drain(..consumed);
        Ok(())
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.encoding.is_passthrough() {
            return self.inner.read(buf);
        }
        while self.pending.is_empty() && !self.eof {
            self.fill()?;
        }
        let count = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

/// Writer accepting UTF-8 and emitting `encoding`.
///
/// Characters outside the target repertoire are written as `?`. A UTF-8
/// sequence split across two writes is held until it completes.
#[derive(Debug)]
pub struct EncodingWriter<W> {
    inner: W,
    encoding: StreamEncoding,
    carry: Vec<u8>,
}

impl<W: Write> EncodingWriter<W> {
    /// Wraps `inner`, encoding to `encoding`.
    pub const fn new(inner: W, encoding: StreamEncoding) -> Self {
        Self {
            inner,
            encoding,
            carry: Vec::new(),
        }
    }
}

impl<W: Write> Write for EncodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.encoding.is_passthrough() {
            return self.inner.write(buf);
        }
        self.carry.extend_from_slice(buf);

        let mut encoded = Vec::with_capacity(self.carry.len() * 2);
        let mut rest: &[u8] = &self.carry;
        loop {
            match str::from_utf8(rest) {
                Ok(text) => {
                    encode(self.encoding, text, &mut encoded);
                    rest = &[];
                    break;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    if let Ok(text) = str::from_utf8(valid) {
                        encode(self.encoding, text, &mut encoded);
                    }
                    match error.error_len() {
                        None => {
                            rest = after;
                            break;
                        }
                        Some(len) => {
                            encode_char(self.encoding, REPLACEMENT_CHARACTER, &mut encoded);
                            rest = after.get(len..).unwrap_or_default();
                        }
                    }
                }
            }
        }
        let consumed = self.carry.len() - rest.len();

        self.inner.write_all(&encoded)?;
        self.carry.drain(..consumed);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Decodes as much of `input` as forms complete characters into `out`.
///
/// Returns the number of input bytes consumed.
fn decode(encoding: StreamEncoding, input: &[u8], out: &mut Vec<u8>) -> usize {
    match encoding {
        StreamEncoding::Utf8 => {
            out.extend_from_slice(input);
            input.len()
        }
        StreamEncoding::Latin1 => {
            for byte in input {
                push_char(out, char::from(*byte));
            }
            input.len()
        }
        StreamEncoding::Ascii => {
            for byte in input {
                let ch = if byte.is_ascii() {
                    char::from(*byte)
                } else {
                    REPLACEMENT_CHARACTER
                };
                push_char(out, ch);
            }
            input.len()
        }
        StreamEncoding::Utf16Le => decode_utf16(input, out, u16::from_le_bytes),
        StreamEncoding::Utf16Be => decode_utf16(input, out, u16::from_be_bytes),
    }
}

fn decode_utf16(input: &[u8], out: &mut Vec<u8>, unit: fn([u8; 2]) -> u16) -> usize {
    let mut units: Vec<u16> = input
        .chunks_exact(2)
        .filter_map(|pair| <[u8; 2]>::try_from(pair).ok())
        .map(unit)
        .collect();
    // A trailing high surrogate waits for its partner.
    if units
        .last()
        .is_some_and(|last| (0xD800..0xDC00).contains(last))
    {
        units.pop();
    }
    for decoded in char::decode_utf16(units.iter().copied()) {
        push_char(out, decoded.unwrap_or(REPLACEMENT_CHARACTER));
    }
    units.len() * 2
}

fn encode(encoding: StreamEncoding, text: &str, out: &mut Vec<u8>) {
    if encoding.is_passthrough() {
        out.extend_from_slice(text.as_bytes());
        return;
    }
    for ch in text.chars() {
        encode_char(encoding, ch, out);
    }
}

fn encode_char(encoding: StreamEncoding, ch: char, out: &mut Vec<u8>) {
    match encoding {
        StreamEncoding::Utf8 => push_char(out, ch),
        StreamEncoding::Latin1 => out.push(u8::try_from(ch).unwrap_or(UNMAPPABLE)),
        StreamEncoding::Ascii => {
            out.push(u8::try_from(ch).ok().filter(u8::is_ascii).unwrap_or(UNMAPPABLE));
        }
        StreamEncoding::Utf16Le => {
            let mut units = [0_u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                out.extend_from_slice(&unit.to_le_bytes());
            }
        }
        StreamEncoding::Utf16Be => {
            let mut units = [0_u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                out.extend_from_slice(&unit.to_be_bytes());
            }
        }
    }
}

fn push_char(out: &mut Vec<u8>, ch: char) {
    let mut buf = [0_u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
}
