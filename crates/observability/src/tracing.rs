//! Subscriber setup for the ledger binaries.
//!
//! One JSON line per event so log shippers can ingest the store and service
//! spans (`#[instrument]` on creates, confirms, voids) without a parsing
//! step.

use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber: JSON output, `RUST_LOG`-driven
/// filtering with an `info` default.
///
/// Idempotent; a second call (tests, embedding callers) is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
