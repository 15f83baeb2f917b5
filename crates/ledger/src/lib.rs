//! `partida-ledger` — double-entry journal domain.
//!
//! Pure domain logic: journal entries (asientos) with owned debit/credit
//! movements (movimientos), the Draft → Confirmed → Voided lifecycle, balance
//! validation, and trial-balance aggregation. No IO; persistence lives in
//! `partida-infra`.

pub mod account;
pub mod entry;
pub mod trial_balance;
pub mod validate;

pub use account::{Account, AccountDirectory};
pub use entry::{EntryStatus, EntryType, JournalEntry, Movement};
pub use trial_balance::{TrialBalanceRow, trial_balance_rows};
pub use validate::{entry_totals, validate_balance, validate_structure};
