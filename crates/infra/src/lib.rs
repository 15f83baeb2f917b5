//! Infrastructure layer: ledger storage backends and the application service.

pub mod directory;
pub mod service;
pub mod store;


pub use directory::InMemoryAccountDirectory;
pub use service::LedgerService;
pub use store::{
    EntryFilter, EntrySummary, InMemoryLedgerStore, LedgerStore, NewEntry, NewMovement,
    PostgresLedgerStore,
};
