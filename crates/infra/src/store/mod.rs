//! Transactional ledger storage boundary.
//!
//! This module defines the storage abstraction for journal entries and their
//! movements without making any backend assumptions. Two implementations are
//! provided: an in-memory store (tests/dev) and a Postgres store (production).

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use r#trait::{EntryFilter, EntrySummary, LedgerStore, NewEntry, NewMovement};
