//! Output handle shared between a host and its worker threads.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable, serialised writer over the console output.
///
/// Every message is written and flushed under one lock acquisition so
/// concurrent writers never interleave partial messages.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedWriter {
    /// Wraps `writer`.
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Writes `line` followed by a newline, then flushes.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    /// Writes every part in order as one message, then flushes.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    pub fn write_message(&self, parts: &[&[u8]]) -> io::Result<()> {
        let mut writer = self.lock();
        for part in parts {
            writer.write_all(part)?;
        }
        writer.flush()
    }

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    // A panic mid-write leaves at worst a truncated message; the writer
    // itself stays usable.
    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}
