//! Console stream acquisition.
//!
//! Streams can only be obtained through [`StreamProvider::open`], which takes
//! the resolved encoding. This makes it impossible to read or write the
//! console before the encoding has been applied.

mod codec;
mod shared;

use std::io::{self, Read, Write};

use courier_config::StreamEncoding;

pub use self::codec::{DecodingReader, EncodingWriter};
pub use self::shared::SharedWriter;

/// Boxed UTF-8 input handed to a host.
pub type ConsoleInput = Box<dyn Read + Send>;

/// Console input and output with the wire encoding applied.
pub struct ConsoleStreams {
    input: ConsoleInput,
    output: SharedWriter,
    encoding: StreamEncoding,
}

impl ConsoleStreams {
    /// Wraps raw wire streams with transcoders for `encoding`.
    pub fn new<R, W>(input: R, output: W, encoding: StreamEncoding) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        Self {
            input: Box::new(DecodingReader::new(input, encoding)),
            output: SharedWriter::new(EncodingWriter::new(output, encoding)),
            encoding,
        }
    }

    /// Encoding applied to both directions.
    #[must_use]
    pub const fn encoding(&self) -> StreamEncoding {
        self.encoding
    }

    /// Splits into the input reader and the shared output writer.
    #[must_use]
    pub fn into_parts(self) -> (ConsoleInput, SharedWriter) {
        (self.input, self.output)
    }
}

impl std::fmt::Debug for ConsoleStreams {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ConsoleStreams")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// Source of the console streams a host communicates over.
pub trait StreamProvider {
    /// Opens the console with `encoding` applied.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the streams cannot be acquired.
    fn open(&self, encoding: StreamEncoding) -> io::Result<ConsoleStreams>;
}

impl<T: StreamProvider + ?Sized> StreamProvider for &T {
    fn open(&self, encoding: StreamEncoding) -> io::Result<ConsoleStreams> {
        (**self).open(encoding)
    }
}

/// Provider backed by the process's standard input and output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdStreamProvider;

impl StreamProvider for StdStreamProvider {
    fn open(&self, encoding: StreamEncoding) -> io::Result<ConsoleStreams> {
        Ok(ConsoleStreams::new(io::stdin(), io::stdout(), encoding))
    }
}
