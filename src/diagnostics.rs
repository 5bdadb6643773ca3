//! Routing of the crate's own tracing diagnostics
//!
//! Internal events (swallowed faults, lifecycle transitions) are written as
//! plain lines into the session log alongside the formatted messages.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::sink::SinkWriter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "relaylog=warn";

/// Install a global tracing subscriber that writes into `sink`
pub fn init_diagnostics(sink: SinkWriter) -> Result<()> {
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(sink)
        .with_ansi(false)
        .with_target(true);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
