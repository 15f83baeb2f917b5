//! Application-level orchestration of the entry lifecycle.
//!
//! `LedgerService` sits between the API layer and the store. Every operation
//! follows the same shape: validate against the account directory and the
//! pure domain rules, then hand the store a persistence step it can apply
//! atomically. Confirmation additionally pins the entry version it validated,
//! so two concurrent confirmations of the same entry resolve to exactly one
//! winner.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::instrument;

use partida_core::{EntryId, ExpectedVersion, LedgerError, MovementId};
use partida_ledger::{
    AccountDirectory, JournalEntry, Movement, TrialBalanceRow, trial_balance_rows,
};

use crate::store::{EntryFilter, EntrySummary, LedgerStore, NewEntry, NewMovement};

/// The ledger's caller-facing service: draft assembly, lifecycle transitions,
/// and reporting.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    directory: Arc<dyn AccountDirectory>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, directory: Arc<dyn AccountDirectory>) -> Self {
        Self { store, directory }
    }

    fn check_movement(&self, movement: &Movement) -> Result<(), LedgerError> {
        movement.check_shape()?;
        if !self.directory.is_imputable(movement.account_id) {
            return Err(LedgerError::validation(format!(
                "account {} is not imputable",
                movement.account_id
            )));
        }
        Ok(())
    }

    /// Create a Draft entry, optionally with initial lines, atomically.
    #[instrument(skip(self, new, lines), err)]
    pub async fn create_entry(
        &self,
        new: NewEntry,
        lines: Vec<NewMovement>,
    ) -> Result<JournalEntry, LedgerError> {
        let movements: Vec<Movement> = lines.into_iter().map(NewMovement::into_movement).collect();
        for movement in &movements {
            self.check_movement(movement)?;
        }
        self.store.create_entry(new, movements).await
    }

    /// Append a line to a Draft entry.
    #[instrument(skip(self, line), fields(entry_id = %entry_id), err)]
    pub async fn add_movement(
        &self,
        entry_id: EntryId,
        line: NewMovement,
    ) -> Result<Movement, LedgerError> {
        let movement = line.into_movement();
        self.check_movement(&movement)?;
        self.store.add_movement(entry_id, movement).await
    }

    /// Remove a line from a Draft entry. Drafts may transiently drop below
    /// two lines; the minimum is enforced at confirm time.
    #[instrument(skip(self), fields(entry_id = %entry_id, movement_id = %movement_id), err)]
    pub async fn remove_movement(
        &self,
        entry_id: EntryId,
        movement_id: MovementId,
    ) -> Result<(), LedgerError> {
        self.store.remove_movement(entry_id, movement_id).await
    }

    /// Update a Draft entry's date and/or description.
    #[instrument(skip(self, description), fields(entry_id = %entry_id), err)]
    pub async fn update_draft(
        &self,
        entry_id: EntryId,
        date: Option<NaiveDate>,
        description: Option<String>,
    ) -> Result<JournalEntry, LedgerError> {
        self.store.update_draft(entry_id, date, description).await
    }

    pub async fn get_entry(&self, entry_id: EntryId) -> Result<JournalEntry, LedgerError> {
        self.store.get_entry(entry_id).await
    }

    pub async fn list_entries(
        &self,
        filter: EntryFilter,
    ) -> Result<Vec<EntrySummary>, LedgerError> {
        self.store.list_entries(filter).await
    }

    /// Delete a Draft entry and its movements.
    #[instrument(skip(self), fields(entry_id = %entry_id), err)]
    pub async fn delete_entry(&self, entry_id: EntryId) -> Result<(), LedgerError> {
        self.store.delete_entry(entry_id).await
    }

    /// Draft → Confirmed.
    ///
    /// Runs the domain confirm against a loaded snapshot; on success the
    /// transition is persisted with an exact version check, so anything
    /// that committed in between (including another confirm) turns this call
    /// into an `InvalidState` loss rather than a double-apply. On failure the
    /// entry remains Draft with no partial changes.
    #[instrument(skip(self), fields(entry_id = %entry_id), err)]
    pub async fn confirm(&self, entry_id: EntryId) -> Result<JournalEntry, LedgerError> {
        let mut entry = self.store.get_entry(entry_id).await?;
        let version = entry.version();
        entry.confirm(self.directory.as_ref())?;
        self.store
            .confirm_entry(entry_id, ExpectedVersion::Exact(version))
            .await
    }

    /// Confirmed → Voided. The entry is kept for audit but stops counting
    /// toward trial balances.
    #[instrument(skip(self, reason), fields(entry_id = %entry_id), err)]
    pub async fn void(
        &self,
        entry_id: EntryId,
        reason: String,
    ) -> Result<JournalEntry, LedgerError> {
        if reason.trim().is_empty() {
            return Err(LedgerError::validation("void reason must not be empty"));
        }
        self.store.void_entry(entry_id, reason).await
    }

    /// Balance de Sumas y Saldos for the inclusive range `[from, to]`.
    ///
    /// Pure function of the confirmed entries in range: recomputed on every
    /// call, never persisted.
    #[instrument(skip(self), err)]
    pub async fn trial_balance(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TrialBalanceRow>, LedgerError> {
        if from > to {
            return Err(LedgerError::validation(
                "date_from must not be after date_to",
            ));
        }
        let entries = self.store.confirmed_in_range(from, to).await?;
        trial_balance_rows(entries.iter(), self.directory.as_ref())
    }
}
