//! Best-effort side channel for faults the logger swallows
//!
//! Writing to stderr must never fail the caller, so the write result is
//! ignored.

use std::fmt::Display;
use std::io::Write;

/// Report a swallowed fault to stderr and as a tracing event
pub fn report(context: &str, err: &dyn Display) {
    tracing::warn!(error = %err, "{}", context);
    let _ = writeln!(std::io::stderr().lock(), "[relaylog] {}: {}", context, err);
}
