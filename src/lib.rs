//! relaylog - process-wide logger with console, session file, archive and
//! listener fan-out
//!
//! A `Logger` renders each message twice (styled console text and plain file
//! text), prints it, appends it to the rotating session log, archives
//! warnings and errors per origin, then notifies listeners.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fault;
pub mod format;
pub mod logger;
pub mod message;
pub mod rotation;
pub mod sink;

pub use config::{LogDirs, LoggerConfig};
pub use error::LogError;
pub use logger::buffer::LogBuffer;
pub use logger::{Fatal, LifecycleState, Logger};
pub use message::{Failure, Frame, Message, Severity};
pub use sink::console::{ColorSink, StdoutColorSink};
pub use sink::SinkWriter;
