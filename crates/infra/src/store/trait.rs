//! Ledger store trait and its request/response shapes.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use partida_core::{AccountId, EntryId, ExpectedVersion, LedgerError, MovementId};
use partida_ledger::{EntryStatus, EntryType, JournalEntry, Movement, entry_totals};

/// Caller-supplied fields for a new draft entry. The store assigns the id and
/// the sequential number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub description: String,
    pub entry_type: EntryType,
}

/// Caller-supplied fields for a new movement. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub account_id: AccountId,
    pub debit: i64,
    pub credit: i64,
    pub memo: Option<String>,
}

impl NewMovement {
    pub fn into_movement(self) -> Movement {
        Movement::new(self.account_id, self.debit, self.credit, self.memo)
    }
}

/// Listing filter; every field optional, combined with AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFilter {
    pub status: Option<EntryStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Listing row: entry header plus its debit/credit totals (what a journal
/// screen displays without expanding the lines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: EntryId,
    pub number: i64,
    pub date: NaiveDate,
    pub description: String,
    pub entry_type: EntryType,
    pub status: EntryStatus,
    pub debit_total: i64,
    pub credit_total: i64,
}

impl EntrySummary {
    pub fn of(entry: &JournalEntry) -> Result<Self, LedgerError> {
        let (debit_total, credit_total) = entry_totals(entry)?;
        Ok(Self {
            id: entry.id_typed(),
            number: entry.number(),
            date: entry.date(),
            description: entry.description().to_string(),
            entry_type: entry.entry_type(),
            status: entry.status(),
            debit_total,
            credit_total,
        })
    }
}

/// Durable, transactional storage for journal entries and movements.
///
/// ## Design principles
///
/// - **Atomic multi-row writes**: an entry plus its movements commit together
///   or not at all; a half-written entry is never observable.
/// - **Gap-free numbering**: the next sequential number is allocated inside
///   the same transaction/critical section that persists the entry, never by
///   read-then-increment in application code. Validation failures do not
///   consume a number.
/// - **Lifecycle enforcement**: mutating operations refuse non-Draft parents;
///   `confirm_entry` admits exactly one winner under concurrency via
///   `ExpectedVersion`.
/// - **Cancellation**: dropping a call future aborts the open transaction;
///   no partial writes survive a timeout.
///
/// Validation of business structure (imputable accounts, balance) is the
/// service's job; implementations here enforce state-machine legality and
/// persistence invariants only.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create a Draft entry with the next sequential number and the given
    /// lines (possibly none), all in one atomic unit.
    async fn create_entry(
        &self,
        new: NewEntry,
        lines: Vec<Movement>,
    ) -> Result<JournalEntry, LedgerError>;

    /// Append a movement to a Draft entry.
    async fn add_movement(
        &self,
        entry_id: EntryId,
        movement: Movement,
    ) -> Result<Movement, LedgerError>;

    /// Remove a movement from a Draft entry.
    async fn remove_movement(
        &self,
        entry_id: EntryId,
        movement_id: MovementId,
    ) -> Result<(), LedgerError>;

    /// Update a Draft entry's date and/or description.
    async fn update_draft(
        &self,
        entry_id: EntryId,
        date: Option<NaiveDate>,
        description: Option<String>,
    ) -> Result<JournalEntry, LedgerError>;

    /// Fetch an entry with all movements populated.
    async fn get_entry(&self, entry_id: EntryId) -> Result<JournalEntry, LedgerError>;

    /// List entries matching the filter, ordered by date ascending then
    /// number ascending (sequential numbers are the deterministic tiebreak).
    async fn list_entries(&self, filter: EntryFilter) -> Result<Vec<EntrySummary>, LedgerError>;

    /// Delete a Draft entry, cascading its movements.
    async fn delete_entry(&self, entry_id: EntryId) -> Result<(), LedgerError>;

    /// Persist the Draft → Confirmed transition. The caller has already run
    /// validation against the version it passes here; any interleaved commit
    /// fails the check and the loser sees `InvalidState`.
    async fn confirm_entry(
        &self,
        entry_id: EntryId,
        expected: ExpectedVersion,
    ) -> Result<JournalEntry, LedgerError>;

    /// Persist the Confirmed → Voided transition with the audit reason.
    async fn void_entry(
        &self,
        entry_id: EntryId,
        reason: String,
    ) -> Result<JournalEntry, LedgerError>;

    /// Confirmed entries with `from <= date <= to`, lines populated, for the
    /// trial-balance scan.
    async fn confirmed_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<JournalEntry>, LedgerError>;
}
