//! Console output with a styled/plain fallback
//!
//! Whether the terminal handles styling is decided by the `ColorSink` that is
//! handed in. `Console` only branches on that answer.

use std::io::{self, IsTerminal, Write};

use crate::fault;
use crate::format::ConsoleText;

use super::SinkWriter;

/// A console destination that may or may not render ANSI styling
pub trait ColorSink: Send {
    /// Whether styled output renders correctly on this sink
    fn supports_styling(&self) -> bool;

    /// Try to enable styling even though it was not detected
    fn force_styling(&mut self) -> io::Result<()>;

    /// Write already-styled text
    fn write_styled(&mut self, text: &str) -> io::Result<()>;

    /// Raw byte stream used for the plain-text fallback
    fn raw_output(&self) -> Box<dyn Write + Send>;
}

/// Standard output as a `ColorSink`
#[derive(Debug, Clone)]
pub struct StdoutColorSink {
    supported: bool,
}

impl StdoutColorSink {
    pub fn new(supported: bool) -> Self {
        Self { supported }
    }

    /// Treat stdout as styled when it is attached to a terminal
    pub fn detect() -> Self {
        Self::new(io::stdout().is_terminal())
    }
}

impl ColorSink for StdoutColorSink {
    fn supports_styling(&self) -> bool {
        self.supported
    }

    fn force_styling(&mut self) -> io::Result<()> {
        self.supported = true;
        Ok(())
    }

    fn write_styled(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    fn raw_output(&self) -> Box<dyn Write + Send> {
        Box::new(io::stdout())
    }
}

/// Console printer, styled or plain
///
/// The mode lives in `styled`; the plain writer is only a lazily built
/// handle, so closing it never changes the mode.
pub struct Console {
    color: Box<dyn ColorSink>,
    styled: bool,
    plain: Option<SinkWriter>,
}

impl Console {
    /// Start out printing styled text to `color`
    pub fn new(color: Box<dyn ColorSink>) -> Self {
        Self {
            color,
            styled: true,
            plain: None,
        }
    }

    pub fn supports_styling(&self) -> bool {
        self.color.supports_styling()
    }

    pub fn force_styling(&mut self) -> io::Result<()> {
        self.color.force_styling()?;
        self.styled = true;
        self.close();
        Ok(())
    }

    /// Switch to plain text over the sink's raw output
    pub fn fall_back_to_plain(&mut self) {
        self.styled = false;
    }

    pub fn is_styled(&self) -> bool {
        self.styled
    }

    pub fn print(&mut self, text: &ConsoleText) {
        if self.styled {
            if let Err(e) = self.color.write_styled(&text.styled()) {
                fault::report("failed to write to console", &e);
            }
            return;
        }

        let color = &self.color;
        self.plain
            .get_or_insert_with(|| SinkWriter::wrap(color.raw_output()))
            .append(&text.plain());
    }

    /// Flush and release the plain writer; the mode is kept
    pub fn close(&mut self) {
        if let Some(plain) = self.plain.take() {
            plain.close();
        }
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("styled", &self.is_styled())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Capturing `ColorSink` for tests

    use std::io::{self, Write};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::ColorSink;

    #[derive(Clone, Default)]
    pub struct Captured(pub Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Records styled and plain output separately
    pub struct CaptureSink {
        pub supported: bool,
        pub forceable: bool,
        pub styled: Captured,
        pub raw: Captured,
    }

    impl CaptureSink {
        pub fn new(supported: bool, forceable: bool) -> Self {
            Self {
                supported,
                forceable,
                styled: Captured::default(),
                raw: Captured::default(),
            }
        }
    }

    impl ColorSink for CaptureSink {
        fn supports_styling(&self) -> bool {
            self.supported
        }

        fn force_styling(&mut self) -> io::Result<()> {
            if self.forceable {
                self.supported = true;
                Ok(())
            } else {
                Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "terminal rejected styling",
                ))
            }
        }

        fn write_styled(&mut self, text: &str) -> io::Result<()> {
            self.styled.write_all(text.as_bytes())
        }

        fn raw_output(&self) -> Box<dyn Write + Send> {
            Box::new(self.raw.clone())
        }
    }
}
