//! Recent-message history kept in memory
//!
//! `LogBuffer` remembers the last few dispatched messages so a host can show
//! them without reading the session log back. WARN and ERROR messages are also
//! kept on their own until the host acknowledges them with `clear_alerts`.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::message::Message;

use super::listeners::Listener;

#[derive(Default)]
struct History {
    recent: VecDeque<Message>,
    alerts: VecDeque<Message>,
}

/// Drop from the front until there is room for one more, then append
fn push_bounded(queue: &mut VecDeque<Message>, cap: usize, msg: Message) {
    if cap == 0 {
        return;
    }
    while queue.len() >= cap {
        queue.pop_front();
    }
    queue.push_back(msg);
}

/// Bounded history of dispatched messages, attachable as a listener
pub struct LogBuffer {
    history: Mutex<History>,
    recent_cap: usize,
    alert_cap: usize,
}

impl LogBuffer {
    /// Keep at most `recent_cap` messages and `alert_cap` unacknowledged alerts
    pub fn new(recent_cap: usize, alert_cap: usize) -> Self {
        Self {
            history: Mutex::new(History::default()),
            recent_cap,
            alert_cap,
        }
    }

    pub fn push(&self, msg: Message) {
        let mut history = self.history.lock();
        if msg.severity().is_alert() {
            push_bounded(&mut history.alerts, self.alert_cap, msg.clone());
        }
        push_bounded(&mut history.recent, self.recent_cap, msg);
    }

    /// Listener that records a copy of every message it sees
    pub fn listener(self: &Arc<Self>) -> Listener {
        let buffer = Arc::clone(self);
        Arc::new(move |msg: &Message| buffer.push(msg.clone()))
    }

    /// Oldest first
    pub fn all_entries(&self) -> Vec<Message> {
        self.history.lock().recent.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history.lock().recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_alerts(&self) -> Vec<Message> {
        self.history.lock().alerts.iter().cloned().collect()
    }

    pub fn alert_count(&self) -> usize {
        self.history.lock().alerts.len()
    }

    /// Acknowledge every pending alert; the recent history is untouched
    pub fn clear_alerts(&self) {
        self.history.lock().alerts.clear();
    }
}
