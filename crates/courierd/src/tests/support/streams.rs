//! In-memory console streams.

use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use courier_config::StreamEncoding;

use crate::streams::{ConsoleStreams, StreamProvider};

/// Cloneable sink recording everything written to it.
#[derive(Clone, Default)]
pub(crate) struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub(crate) fn bytes(&self) -> Vec<u8> {
        self.0.lock().expect("output lock").clone()
    }

    pub(crate) fn text(&self) -> String {
        String::from_utf8(self.bytes()).expect("output is UTF-8")
    }

    pub(crate) fn json_lines(&self) -> Vec<serde_json::Value> {
        self.text()
            .lines()
            .map(|line| serde_json::from_str(line).expect("output line is JSON"))
            .collect()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("output lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Provider serving fixed input bytes and capturing output.
///
/// Records the encoding of every `open` call.
#[derive(Default)]
pub(crate) struct MemoryStreams {
    input: Vec<u8>,
    output: CapturedOutput,
    opened: Mutex<Vec<StreamEncoding>>,
    fail: bool,
}

impl MemoryStreams {
    pub(crate) fn with_input(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn output(&self) -> CapturedOutput {
        self.output.clone()
    }

    pub(crate) fn opened(&self) -> Vec<StreamEncoding> {
        self.opened.lock().expect("opened lock").clone()
    }

    /// Streams for direct host construction, bypassing the provider.
    pub(crate) fn console(&self, encoding: StreamEncoding) -> ConsoleStreams {
        ConsoleStreams::new(Cursor::new(self.input.clone()), self.output.clone(), encoding)
    }
}

impl StreamProvider for MemoryStreams {
    fn open(&self, encoding: StreamEncoding) -> io::Result<ConsoleStreams> {
        self.opened.lock().expect("opened lock").push(encoding);
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "console unavailable"));
        }
        Ok(self.console(encoding))
    }
}
