//! The logging facade
//!
//! A `Logger` owns everything a session needs: the display name and log
//! directories, the session log sink, the console, the debug flag and the
//! listener registries. Every dispatch runs under one re-entrant lock, so the
//! console, file and listener effects of one message never interleave with
//! another message's.

pub mod buffer;
pub mod listeners;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::config::{LogDirs, LoggerConfig};
use crate::fault;
use crate::format::{self, FormatContext};
use crate::message::{Failure, Message, Severity};
use crate::rotation;
use crate::sink::console::{ColorSink, Console, StdoutColorSink};
use crate::sink::SinkWriter;

use listeners::{Listener, Listeners};

/// Exit status an application should use when acting on a `Fatal`
pub const FATAL_EXIT_CODE: i32 = 0;

/// Archive name used when a WARN/ERROR carries no failure
pub const NO_EXCEPTION: &str = "No Exception";

/// Origin of the logger's own lifecycle messages
const LOGGER_ORIGIN: &str = concat!(module_path!(), "::Logger");

/// Lifecycle of a `Logger`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Started,
    Stopped,
}

/// Returned by ERROR dispatch once the message is logged, the grace period
/// has passed and listeners have run. The owning application decides when to
/// exit.
#[must_use = "an ERROR asks the application to shut down"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fatal {
    exit_code: i32,
}

impl Fatal {
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Terminate the process
    pub fn exit(self) -> ! {
        std::process::exit(self.exit_code)
    }
}

/// Remove characters that can't appear in a file name
pub fn sanitize_file_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '*' | '<' | '>' | ':' | '?' | '/' | '"' | '\\' | '|'))
        .collect()
}

/// Name of the per-origin archive file (without extension) for a WARN/ERROR
///
/// Taken from the failure's first frame, then the message origin, then
/// `NO_EXCEPTION`.
pub fn archive_file_name(msg: &Message) -> String {
    let raw = match msg.failure() {
        Some(failure) => match failure.frames.first() {
            Some(frame) => format!("{}()", frame.function.replace("::", ".")),
            None => msg
                .origin()
                .map(|o| o.replace("::", "."))
                .unwrap_or_else(|| NO_EXCEPTION.to_string()),
        },
        None => NO_EXCEPTION.to_string(),
    };

    let name = sanitize_file_name(&raw);
    if name.trim().is_empty() {
        NO_EXCEPTION.to_string()
    } else {
        name
    }
}

/// Process-wide logger
pub struct Logger {
    lifecycle: Mutex<LifecycleState>,
    context: RwLock<FormatContext>,
    dirs: RwLock<Option<LogDirs>>,
    sink: SinkWriter,
    console: Mutex<Console>,
    listeners: Listeners,
    debug_enabled: AtomicBool,
    dispatch: ReentrantMutex<()>,
}

impl Logger {
    /// Create a logger printing to `color`; nothing is written to disk until `start`
    pub fn new(color: Box<dyn ColorSink>) -> Self {
        let defaults = LoggerConfig::default();
        let mut context = FormatContext::new(defaults.name.clone(), defaults.dirs().full);
        context.shutdown_delay = defaults.shutdown_delay();

        Self {
            lifecycle: Mutex::new(LifecycleState::NotStarted),
            context: RwLock::new(context),
            dirs: RwLock::new(None),
            sink: SinkWriter::new(),
            console: Mutex::new(Console::new(color)),
            listeners: Listeners::new(),
            debug_enabled: AtomicBool::new(defaults.debug),
            dispatch: ReentrantMutex::new(()),
        }
    }

    /// Create a logger on stdout, styled when stdout is a terminal
    pub fn stdout() -> Self {
        Self::new(Box::new(StdoutColorSink::detect()))
    }

    /// Start the session: create the log tree, rotate the previous session
    /// log, open the new one and settle the console mode
    ///
    /// Only the first call has any effect.
    pub fn start(&self, config: &LoggerConfig) {
        {
            let mut lifecycle = self.lifecycle.lock();
            if *lifecycle != LifecycleState::NotStarted {
                tracing::debug!(state = ?*lifecycle, "Logger already started, ignoring start");
                return;
            }
            *lifecycle = LifecycleState::Started;
        }

        self.debug_enabled.store(config.debug, Ordering::SeqCst);

        let dirs = config.dirs();
        if let Err(e) = dirs.ensure() {
            fault::report("failed to create log directories", &e);
        }
        let full_dir = std::fs::canonicalize(&dirs.full).unwrap_or_else(|_| dirs.full.clone());
        *self.context.write() = FormatContext {
            name: config.name.clone(),
            full_dir,
            shutdown_delay: config.shutdown_delay(),
        };

        match rotation::rotate_latest(&dirs.full) {
            Ok((latest, _)) => {
                if let Err(e) = self.sink.open(&latest) {
                    fault::report("failed to open session log", &e);
                }
            }
            Err(e) => fault::report("failed to prepare session log", &e),
        }
        *self.dirs.write() = Some(dirs);

        let supported = self.console.lock().supports_styling();
        if !supported {
            self.console.lock().fall_back_to_plain();
            if !config.force_styled {
                self.warn("Disabled ANSI/colored output, due to unsupported terminal.");
            }
        }

        if config.force_styled {
            let forced = self.console.lock().force_styling();
            match forced {
                Ok(()) => self.info("Forced terminal to use ANSI."),
                Err(e) => self.warn_with(
                    Some("Failed to force terminal to use ANSI.".to_string()),
                    Failure::from_error(&e),
                ),
            }
        }

        tracing::debug!(name = %config.name, log_dir = %config.log_dir.display(), "Logger started");
        self.debug(LOGGER_ORIGIN, format!("Started Logger({})", config.name));
    }

    /// Log a final DEBUG line and release the session log; safe to call repeatedly
    pub fn stop(&self) {
        {
            let mut lifecycle = self.lifecycle.lock();
            if *lifecycle != LifecycleState::Started {
                return;
            }
            *lifecycle = LifecycleState::Stopped;
        }

        let name = self.context.read().name.clone();
        self.debug(LOGGER_ORIGIN, format!("Stopped {}", name));

        let _guard = self.dispatch.lock();
        self.console.lock().close();
        self.sink.close();
        tracing::debug!(%name, "Logger stopped");
    }

    pub fn info(&self, content: impl Into<String>) {
        self.dispatch(Message::new(Severity::Info, Some(content.into())));
    }

    /// Always written to the session log; printed only when debug is enabled
    pub fn debug(&self, origin: &str, content: impl Into<String>) {
        self.dispatch(Message::new(Severity::Debug, Some(content.into())).with_origin(origin));
    }

    pub fn warn(&self, content: impl Into<String>) {
        self.dispatch(Message::new(Severity::Warn, Some(content.into())));
    }

    pub fn warn_with(&self, content: Option<String>, failure: Failure) {
        self.dispatch(Message::new(Severity::Warn, content).with_failure(failure));
    }

    /// Log a fatal error
    ///
    /// Blocks for the configured grace period before notifying listeners, then
    /// returns the signal the application should exit on.
    pub fn error(&self, content: Option<String>, failure: Option<Failure>) -> Fatal {
        let mut msg = Message::new(Severity::Error, content);
        if let Some(failure) = failure {
            msg = msg.with_failure(failure);
        }
        self.dispatch(msg);
        Fatal {
            exit_code: FATAL_EXIT_CODE,
        }
    }

    /// Dispatch a prepared message; returns `Some` for ERROR
    pub fn log(&self, msg: Message) -> Option<Fatal> {
        let severity = msg.severity();
        self.dispatch(msg);
        (severity == Severity::Error).then_some(Fatal {
            exit_code: FATAL_EXIT_CODE,
        })
    }

    fn dispatch(&self, msg: Message) {
        let _guard = self.dispatch.lock();
        let ctx = self.context.read().clone();

        let console_text = format::format_console(&msg, &ctx);
        let file_text = format::format_file(&msg, &ctx);

        if msg.severity() != Severity::Debug || self.is_debug_enabled() {
            self.console.lock().print(&console_text);
        }
        self.sink.append(&file_text);

        if msg.severity().is_alert() {
            self.archive(&msg, &file_text);
        }

        if msg.severity() == Severity::Error {
            // The whole grace period is waited out; nothing shortens it.
            thread::sleep(ctx.shutdown_delay);
        }

        self.listeners.notify(&msg);
    }

    /// Append the file rendering to `warn/<origin>.log` or `error/<origin>.log`
    fn archive(&self, msg: &Message, file_text: &str) {
        let dir = match self.dirs.read().as_ref() {
            Some(dirs) if msg.severity() == Severity::Error => dirs.error.clone(),
            Some(dirs) => dirs.warn.clone(),
            None => return,
        };
        let path = dir.join(format!("{}.log", archive_file_name(msg)));

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(file_text.as_bytes()));
        if let Err(e) = result {
            fault::report(&format!("failed to write archive {}", path.display()), &e);
        }
    }

    /// Register a listener for every message
    pub fn on_message(&self, listener: impl Fn(&Message) + Send + Sync + 'static) {
        self.listeners.register_any(Arc::new(listener));
    }

    pub fn on_info(&self, listener: impl Fn(&Message) + Send + Sync + 'static) {
        self.listeners.register(Severity::Info, Arc::new(listener));
    }

    pub fn on_debug(&self, listener: impl Fn(&Message) + Send + Sync + 'static) {
        self.listeners.register(Severity::Debug, Arc::new(listener));
    }

    pub fn on_warn(&self, listener: impl Fn(&Message) + Send + Sync + 'static) {
        self.listeners.register(Severity::Warn, Arc::new(listener));
    }

    pub fn on_error(&self, listener: impl Fn(&Message) + Send + Sync + 'static) {
        self.listeners.register(Severity::Error, Arc::new(listener));
    }

    /// Register an already shared listener for every message
    pub fn add_listener(&self, listener: Listener) {
        self.listeners.register_any(listener);
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.debug_enabled.load(Ordering::SeqCst)
    }

    pub fn set_debug_enabled(&self, enabled: bool) {
        self.debug_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_styled(&self) -> bool {
        self.console.lock().is_styled()
    }

    pub fn state(&self) -> LifecycleState {
        *self.lifecycle.lock()
    }

    pub fn dirs(&self) -> Option<LogDirs> {
        self.dirs.read().clone()
    }

    /// Path of the current session log
    pub fn log_file(&self) -> Option<PathBuf> {
        self.sink.path()
    }

    /// Handle to the session log sink, e.g. as a tracing-subscriber writer
    pub fn sink(&self) -> SinkWriter {
        self.sink.clone()
    }

    pub fn name(&self) -> String {
        self.context.read().name.clone()
    }

    pub fn shutdown_delay(&self) -> Duration {
        self.context.read().shutdown_delay
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.sink.close();
    }
}
