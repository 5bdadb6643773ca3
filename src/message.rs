//! Message value types
//!
//! A `Message` is built once per dispatch call and never mutated afterwards.
//! Only its renderings outlive the call.

use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use chrono::{DateTime, Local};

/// Severity of a message, in increasing order of urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Debug,
    Warn,
    Error,
}

impl Severity {
    /// Get the display name for this severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    /// Check if this severity is archived per origin (warnings and errors)
    pub fn is_alert(&self) -> bool {
        matches!(self, Severity::Warn | Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a failure's trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Fully qualified function path
    pub function: String,
    /// Source file, when known
    pub file: Option<String>,
    /// Line in `file`, when known
    pub line: Option<u32>,
}

impl Frame {
    /// Create a frame without location information
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            file: None,
            line: None,
        }
    }

    /// Attach a source location
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}({}:{})", self.function, file, line),
            (Some(file), None) => write!(f, "{}({})", self.function, file),
            _ => write!(f, "{}(Unknown Source)", self.function),
        }
    }
}

/// A captured error: its message, the message of its cause, and its trace
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Failure {
    pub message: String,
    pub cause: Option<String>,
    pub frames: Vec<Frame>,
}

impl Failure {
    /// Create a failure with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            frames: Vec::new(),
        }
    }

    /// Build a failure from an error value, without a trace
    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        Self {
            message: err.to_string(),
            cause: err.source().map(|s| s.to_string()),
            frames: Vec::new(),
        }
    }

    /// Build a failure from an error value and capture the current call stack
    pub fn capture(err: &(dyn Error + 'static)) -> Self {
        let backtrace = Backtrace::force_capture();
        Self {
            frames: parse_backtrace(&backtrace.to_string()),
            ..Self::from_error(err)
        }
    }

    /// Set the cause message
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Append a frame to the trace
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }
}

impl From<&anyhow::Error> for Failure {
    fn from(err: &anyhow::Error) -> Self {
        Self {
            message: err.to_string(),
            cause: err.chain().nth(1).map(|c| c.to_string()),
            frames: Vec::new(),
        }
    }
}

/// Parse the `Display` form of a `Backtrace`
///
/// Frames look like `  3: crate::module::function` optionally followed by a
/// line `at /path/to/file.rs:12:5`. Frames from the capture machinery itself
/// are dropped so the first frame is the caller of `Failure::capture`.
fn parse_backtrace(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in text.lines().map(str::trim) {
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.file.is_none() {
                    let (file, line) = split_location(location);
                    frame.file = Some(file);
                    frame.line = line;
                }
            }
            continue;
        }

        if let Some((index, function)) = line.split_once(": ") {
            if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
                frames.push(Frame::new(strip_hash(function)));
            }
        }
    }

    let skip = frames
        .iter()
        .rposition(|f| f.function.contains("Failure::capture"))
        .map(|pos| pos + 1)
        .unwrap_or(0);
    frames.split_off(skip)
}

/// Split `path:line:column` into the path and line number
fn split_location(location: &str) -> (String, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let column = parts.next();
    let line = parts.next();
    match (parts.next(), line, column) {
        (Some(file), Some(line), Some(_)) => (file.to_string(), line.parse().ok()),
        _ => (location.to_string(), None),
    }
}

/// Drop the `::h0123456789abcdef` symbol hash suffix
fn strip_hash(function: &str) -> &str {
    match function.rsplit_once("::h") {
        Some((path, hash)) if hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit()) => {
            path
        }
        _ => function,
    }
}

/// A single log message
#[derive(Debug, Clone)]
pub struct Message {
    severity: Severity,
    timestamp: DateTime<Local>,
    content: Option<String>,
    origin: Option<String>,
    failure: Option<Failure>,
}

impl Message {
    /// Create a message stamped with the current local time
    pub fn new(severity: Severity, content: Option<String>) -> Self {
        Self {
            severity,
            timestamp: Local::now(),
            content: content.filter(|c| !c.is_empty()),
            origin: None,
            failure: None,
        }
    }

    /// Set the reporting origin
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Attach a failure
    pub fn with_failure(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Override the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Last `::` segment of the origin, e.g. `Session` for `app::session::Session`
    pub fn origin_short_name(&self) -> Option<&str> {
        self.origin
            .as_deref()
            .map(|o| o.rsplit("::").next().unwrap_or(o))
    }
}
