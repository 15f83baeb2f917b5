//! In-memory ledger store.
//!
//! Intended for tests/dev. A single lock over the whole state stands in for
//! the transaction boundary: every operation runs under it, so multi-row
//! writes are atomic and number allocation is gap-free by construction.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;

use partida_core::{EntryId, ExpectedVersion, LedgerError, MovementId};
use partida_ledger::{EntryStatus, JournalEntry, Movement};

use super::r#trait::{EntryFilter, EntrySummary, LedgerStore, NewEntry};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<EntryId, JournalEntry>,
    last_number: i64,
}

/// In-memory `LedgerStore`. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Inner>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned() -> LedgerError {
    LedgerError::storage("lock poisoned")
}

fn matches_filter(entry: &JournalEntry, filter: &EntryFilter) -> bool {
    if let Some(status) = filter.status {
        if entry.status() != status {
            return false;
        }
    }
    if let Some(from) = filter.date_from {
        if entry.date() < from {
            return false;
        }
    }
    if let Some(to) = filter.date_to {
        if entry.date() > to {
            return false;
        }
    }
    true
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_entry(
        &self,
        new: NewEntry,
        lines: Vec<Movement>,
    ) -> Result<JournalEntry, LedgerError> {
        let mut inner = self.inner.write().map_err(|_| lock_poisoned())?;

        // Build and validate before bumping the counter, so a rejected
        // request never consumes a number.
        let number = inner.last_number + 1;
        let mut entry = JournalEntry::new_draft(number, new.date, new.description, new.entry_type)?;
        for movement in lines {
            entry.add_line(movement)?;
        }

        inner.last_number = number;
        inner.entries.insert(entry.id_typed(), entry.clone());
        Ok(entry)
    }

    async fn add_movement(
        &self,
        entry_id: EntryId,
        movement: Movement,
    ) -> Result<Movement, LedgerError> {
        let mut inner = self.inner.write().map_err(|_| lock_poisoned())?;
        let entry = inner.entries.get_mut(&entry_id).ok_or(LedgerError::NotFound)?;
        entry.add_line(movement.clone())?;
        entry.bump_version();
        Ok(movement)
    }

    async fn remove_movement(
        &self,
        entry_id: EntryId,
        movement_id: MovementId,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().map_err(|_| lock_poisoned())?;
        let entry = inner.entries.get_mut(&entry_id).ok_or(LedgerError::NotFound)?;
        entry.remove_line(movement_id)?;
        entry.bump_version();
        Ok(())
    }

    async fn update_draft(
        &self,
        entry_id: EntryId,
        date: Option<NaiveDate>,
        description: Option<String>,
    ) -> Result<JournalEntry, LedgerError> {
        let mut inner = self.inner.write().map_err(|_| lock_poisoned())?;
        let entry = inner.entries.get_mut(&entry_id).ok_or(LedgerError::NotFound)?;

        // Edit a copy so a failure midway leaves the stored entry untouched;
        // both fields land together or not at all.
        let mut updated = entry.clone();
        if let Some(date) = date {
            updated.set_date(date)?;
        }
        if let Some(description) = description {
            updated.set_description(description)?;
        }
        updated.bump_version();
        *entry = updated.clone();
        Ok(updated)
    }

    async fn get_entry(&self, entry_id: EntryId) -> Result<JournalEntry, LedgerError> {
        let inner = self.inner.read().map_err(|_| lock_poisoned())?;
        inner
            .entries
            .get(&entry_id)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }

    async fn list_entries(&self, filter: EntryFilter) -> Result<Vec<EntrySummary>, LedgerError> {
        let inner = self.inner.read().map_err(|_| lock_poisoned())?;
        let mut matching: Vec<&JournalEntry> = inner
            .entries
            .values()
            .filter(|e| matches_filter(e, &filter))
            .collect();
        matching.sort_by_key(|e| (e.date(), e.number()));
        matching.into_iter().map(EntrySummary::of).collect()
    }

    async fn delete_entry(&self, entry_id: EntryId) -> Result<(), LedgerError> {
        let mut inner = self.inner.write().map_err(|_| lock_poisoned())?;
        let entry = inner.entries.get(&entry_id).ok_or(LedgerError::NotFound)?;
        match entry.status() {
            EntryStatus::Draft => {
                // Movements are owned by the entry; removing it drops them too.
                inner.entries.remove(&entry_id);
                Ok(())
            }
            EntryStatus::Confirmed => Err(LedgerError::invalid_state(
                "cannot delete: entry is confirmed",
            )),
            EntryStatus::Voided => {
                Err(LedgerError::invalid_state("cannot delete: entry is voided"))
            }
        }
    }

    async fn confirm_entry(
        &self,
        entry_id: EntryId,
        expected: ExpectedVersion,
    ) -> Result<JournalEntry, LedgerError> {
        let mut inner = self.inner.write().map_err(|_| lock_poisoned())?;
        let entry = inner.entries.get_mut(&entry_id).ok_or(LedgerError::NotFound)?;
        expected.check(entry.version())?;
        entry.apply_confirmation()?;
        entry.bump_version();
        Ok(entry.clone())
    }

    async fn void_entry(
        &self,
        entry_id: EntryId,
        reason: String,
    ) -> Result<JournalEntry, LedgerError> {
        let mut inner = self.inner.write().map_err(|_| lock_poisoned())?;
        let entry = inner.entries.get_mut(&entry_id).ok_or(LedgerError::NotFound)?;
        entry.void(reason)?;
        entry.bump_version();
        Ok(entry.clone())
    }

    async fn confirmed_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        let inner = self.inner.read().map_err(|_| lock_poisoned())?;
        let mut entries: Vec<JournalEntry> = inner
            .entries
            .values()
            .filter(|e| e.status() == EntryStatus::Confirmed && e.date() >= from && e.date() <= to)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.date(), e.number()));
        Ok(entries)
    }
}
