//! Listener registries
//!
//! Each registry is a copy-on-write list: registration swaps in a new list,
//! and a notification pass iterates the snapshot it started with. Listeners
//! added during a pass are seen from the next message on.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::fault;
use crate::message::{Message, Severity};

/// Callback invoked with every dispatched message it is registered for
pub type Listener = Arc<dyn Fn(&Message) + Send + Sync>;

#[derive(Default)]
struct Registry {
    listeners: RwLock<Arc<Vec<Listener>>>,
}

impl Registry {
    fn register(&self, listener: Listener) {
        let mut current = self.listeners.write();
        let mut next = Vec::clone(&current);
        next.push(listener);
        *current = Arc::new(next);
    }

    fn snapshot(&self) -> Arc<Vec<Listener>> {
        Arc::clone(&self.listeners.read())
    }

    fn len(&self) -> usize {
        self.listeners.read().len()
    }
}

/// The catch-all registry plus one registry per severity
#[derive(Default)]
pub struct Listeners {
    any: Registry,
    info: Registry,
    debug: Registry,
    warn: Registry,
    error: Registry,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    fn for_severity(&self, severity: Severity) -> &Registry {
        match severity {
            Severity::Info => &self.info,
            Severity::Debug => &self.debug,
            Severity::Warn => &self.warn,
            Severity::Error => &self.error,
        }
    }

    /// Register for every message
    pub fn register_any(&self, listener: Listener) {
        self.any.register(listener);
    }

    /// Register for messages of one severity
    pub fn register(&self, severity: Severity, listener: Listener) {
        self.for_severity(severity).register(listener);
    }

    /// Number of listeners that would see a message of `severity`
    pub fn count(&self, severity: Severity) -> usize {
        self.any.len() + self.for_severity(severity).len()
    }

    /// Notify catch-all listeners, then the message's severity listeners
    ///
    /// A panicking listener is reported and skipped; the rest still run.
    pub fn notify(&self, msg: &Message) {
        let passes = [self.any.snapshot(), self.for_severity(msg.severity()).snapshot()];
        for listener in passes.iter().flat_map(|list| list.iter()) {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(msg))) {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                fault::report(&format!("{} listener panicked", msg.severity()), &reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Listener {
        let log = Arc::clone(log);
        Arc::new(move |msg: &Message| {
            log.lock()
                .push(format!("{}:{}", tag, msg.content().unwrap_or_default()))
        })
    }

    #[test]
    fn test_catch_all_fires_before_severity_listeners() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let listeners = Listeners::new();
        listeners.register(Severity::Warn, recorder(&log, "warn1"));
        listeners.register_any(recorder(&log, "any1"));
        listeners.register(Severity::Warn, recorder(&log, "warn2"));
        listeners.register_any(recorder(&log, "any2"));
        listeners.register(Severity::Info, recorder(&log, "info"));

        listeners.notify(&Message::new(Severity::Warn, Some("w".into())));

        assert_eq!(*log.lock(), vec!["any1:w", "any2:w", "warn1:w", "warn2:w"]);
        assert_eq!(listeners.count(Severity::Warn), 4);
        assert_eq!(listeners.count(Severity::Debug), 2);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let listeners = Listeners::new();
        listeners.register_any(Arc::new(|_: &Message| panic!("listener broke")));
        listeners.register_any(recorder(&log, "after"));

        listeners.notify(&Message::new(Severity::Info, Some("i".into())));

        assert_eq!(*log.lock(), vec!["after:i"]);
    }

    #[test]
    fn test_registration_during_notification() {
        let listeners = Arc::new(Listeners::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&listeners);
        let inner_log = Arc::clone(&log);
        listeners.register_any(Arc::new(move |_: &Message| {
            inner.register_any(recorder(&inner_log, "late"));
        }));

        listeners.notify(&Message::new(Severity::Info, Some("first".into())));
        assert!(log.lock().is_empty());

        listeners.notify(&Message::new(Severity::Info, Some("second".into())));
        assert_eq!(*log.lock(), vec!["late:second"]);
    }
}
