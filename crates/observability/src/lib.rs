//! `partida-observability` — structured logging for the ledger binaries.

/// Set up logging for the process. Call once at the top of `main`;
/// extra calls are harmless.
pub fn init() {
    tracing::init();
}

pub mod tracing;
