//! Thread-safe log sinks
//!
//! `SinkWriter` owns one output target (the session log file, or any wrapped
//! byte stream) behind a lock. Appends from any thread are serialized, and
//! I/O failures are reported to the fault channel instead of the caller.

pub mod console;

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

use crate::error::{LogError, Result};
use crate::fault;

type Target = Box<dyn Write + Send>;

#[derive(Default)]
struct Inner {
    target: Option<Target>,
    path: Option<PathBuf>,
}

/// Shared handle to a serialized output target
///
/// Clones share the same target.
#[derive(Clone, Default)]
pub struct SinkWriter {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for SinkWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SinkWriter")
            .field("open", &inner.target.is_some())
            .field("path", &inner.path)
            .finish()
    }
}

impl SinkWriter {
    /// Create a writer with no target; appends are dropped until `open`
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plain-text writer over an arbitrary byte sink
    pub fn wrap<W: Write + Send + 'static>(out: W) -> Self {
        let writer = Self::new();
        writer.inner.lock().target = Some(Box::new(BufWriter::new(out)));
        writer
    }

    /// Create or truncate `path` and direct subsequent appends to it
    ///
    /// A previously open target is flushed and released first.
    pub fn open(&self, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| LogError::io("failed to open log file", path, e))?;

        let mut inner = self.inner.lock();
        if let Some(mut old) = inner.target.take() {
            let _ = old.flush();
        }
        inner.target = Some(Box::new(BufWriter::new(file)));
        inner.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Append text and flush it through to the target
    pub fn append(&self, text: &str) {
        if let Err(e) = self.write_bytes(text.as_bytes()) {
            fault::report("failed to append to log", &e);
        }
    }

    fn write_bytes(&self, buf: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock();
        match inner.target.as_mut() {
            Some(target) => {
                target.write_all(buf)?;
                target.flush()
            }
            None => Ok(()),
        }
    }

    /// Flush and release the target; safe to call repeatedly
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if let Some(mut target) = inner.target.take() {
            if let Err(e) = target.flush() {
                fault::report("failed to flush log on close", &e);
            }
        }
        inner.path = None;
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().target.is_some()
    }

    /// Path of the open log file, if the target is a file
    pub fn path(&self) -> Option<PathBuf> {
        self.inner.lock().path.clone()
    }
}

/// `io::Write` handle used by tracing-subscriber
///
/// Errors are returned to the subscriber rather than reported, so a broken
/// sink cannot feed back into itself through the fault channel.
pub struct SinkHandle {
    sink: SinkWriter,
}

impl Write for SinkHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.sink.inner.lock().target.as_mut() {
            Some(target) => target.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for SinkWriter {
    type Writer = SinkHandle;

    fn make_writer(&'a self) -> Self::Writer {
        SinkHandle { sink: self.clone() }
    }
}
