//! Journal entries and their owned movements.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use partida_core::{AccountId, Entity, EntryId, LedgerError, LedgerResult, MovementId};

use crate::account::AccountDirectory;
use crate::validate::{validate_balance, validate_structure};

/// Kind of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Opening,
    Daily,
    Adjustment,
    Closing,
}

/// Entry lifecycle status.
///
/// `Draft` is the only editable state. `Confirmed` entries are part of the
/// permanent record; the only transition out is an explicit void. `Voided`
/// is terminal: the entry is retained for audit but no longer counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Draft,
    Confirmed,
    Voided,
}

impl EntryStatus {
    pub fn is_editable(self) -> bool {
        self == EntryStatus::Draft
    }
}

/// One debit-or-credit line of a journal entry.
///
/// Owned exclusively by its entry. Exactly one of `debit`/`credit` is
/// non-zero; amounts are in the smallest currency unit (e.g. cents), so
/// balance comparison is exact integer equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub account_id: AccountId,
    pub debit: i64,
    pub credit: i64,
    pub memo: Option<String>,
}

impl Movement {
    pub fn new(account_id: AccountId, debit: i64, credit: i64, memo: Option<String>) -> Self {
        Self {
            id: MovementId::new(),
            account_id,
            debit,
            credit,
            memo,
        }
    }

    /// Exactly one non-zero side, both sides non-negative.
    pub fn check_shape(&self) -> LedgerResult<()> {
        if self.debit < 0 || self.credit < 0 {
            return Err(LedgerError::validation("amounts must be non-negative"));
        }
        if self.debit == 0 && self.credit == 0 {
            return Err(LedgerError::validation(
                "movement must carry a debit or a credit",
            ));
        }
        if self.debit != 0 && self.credit != 0 {
            return Err(LedgerError::validation(
                "movement cannot carry both a debit and a credit",
            ));
        }
        Ok(())
    }
}

impl Entity for Movement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Journal entry (asiento): a dated, described set of debit/credit postings.
///
/// The entry owns its movements (lifetime = entry's lifetime). Lifecycle
/// transitions are explicit methods; once `confirm` has verified the balance
/// the lines can never change underneath a report that already counted them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    id: EntryId,
    /// Sequential, unique, immutable; assigned by the store at creation.
    number: i64,
    date: NaiveDate,
    description: String,
    entry_type: EntryType,
    status: EntryStatus,
    void_reason: Option<String>,
    lines: Vec<Movement>,
    /// Bumped by the store on every persisted mutation; backs the
    /// optimistic one-winner check on confirmation.
    version: u64,
}

impl JournalEntry {
    /// New draft with zero lines. Fails if the description is blank.
    pub fn new_draft(
        number: i64,
        date: NaiveDate,
        description: impl Into<String>,
        entry_type: EntryType,
    ) -> LedgerResult<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(LedgerError::validation("description must not be empty"));
        }
        Ok(Self {
            id: EntryId::new(),
            number,
            date,
            description,
            entry_type,
            status: EntryStatus::Draft,
            void_reason: None,
            lines: Vec::new(),
            version: 0,
        })
    }

    /// Rehydrate from persisted rows. The store is trusted to hand back what
    /// it was given; no re-validation happens here.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: EntryId,
        number: i64,
        date: NaiveDate,
        description: String,
        entry_type: EntryType,
        status: EntryStatus,
        void_reason: Option<String>,
        lines: Vec<Movement>,
        version: u64,
    ) -> Self {
        Self {
            id,
            number,
            date,
            description,
            entry_type,
            status,
            void_reason,
            lines,
            version,
        }
    }

    pub fn id_typed(&self) -> EntryId {
        self.id
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn void_reason(&self) -> Option<&str> {
        self.void_reason.as_deref()
    }

    pub fn lines(&self) -> &[Movement] {
        &self.lines
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn require_draft(&self, action: &str) -> LedgerResult<()> {
        match self.status {
            EntryStatus::Draft => Ok(()),
            EntryStatus::Confirmed => Err(LedgerError::invalid_state(format!(
                "cannot {action}: entry is confirmed"
            ))),
            EntryStatus::Voided => Err(LedgerError::invalid_state(format!(
                "cannot {action}: entry is voided"
            ))),
        }
    }

    /// Change the date. Draft only.
    pub fn set_date(&mut self, date: NaiveDate) -> LedgerResult<()> {
        self.require_draft("edit date")?;
        self.date = date;
        Ok(())
    }

    /// Change the description. Draft only; blank rejected.
    pub fn set_description(&mut self, description: impl Into<String>) -> LedgerResult<()> {
        self.require_draft("edit description")?;
        let description = description.into();
        if description.trim().is_empty() {
            return Err(LedgerError::validation("description must not be empty"));
        }
        self.description = description;
        Ok(())
    }

    /// Append a movement. Draft only; the movement shape is checked eagerly
    /// so a line that is zero/zero or double-sided never enters the entry.
    pub fn add_line(&mut self, movement: Movement) -> LedgerResult<MovementId> {
        self.require_draft("add movement")?;
        movement.check_shape()?;
        let id = movement.id;
        self.lines.push(movement);
        Ok(id)
    }

    /// Remove a movement by id. Draft only.
    ///
    /// A draft may transiently drop below two lines; the minimum is enforced
    /// at confirm time, not per edit.
    pub fn remove_line(&mut self, movement_id: MovementId) -> LedgerResult<Movement> {
        self.require_draft("remove movement")?;
        let idx = self
            .lines
            .iter()
            .position(|m| m.id == movement_id)
            .ok_or(LedgerError::NotFound)?;
        Ok(self.lines.remove(idx))
    }

    /// Draft → Confirmed. Runs structural validation then the exact balance
    /// check; on any failure the entry is left untouched in Draft.
    ///
    /// This is the one confirm implementation; the lifecycle manager runs it
    /// against a loaded snapshot before persisting the transition.
    pub fn confirm(&mut self, directory: &dyn AccountDirectory) -> LedgerResult<()> {
        self.require_draft("confirm")?;
        validate_structure(self, directory)?;
        validate_balance(self)?;
        self.apply_confirmation()
    }

    /// Store-side Draft → Confirmed transition. `confirm` has already run
    /// structure and balance validation against the version being written
    /// back; this only enforces state legality.
    pub fn apply_confirmation(&mut self) -> LedgerResult<()> {
        self.require_draft("confirm")?;
        self.status = EntryStatus::Confirmed;
        Ok(())
    }

    /// Confirmed → Voided. The entry and its movements are retained for
    /// audit but excluded from trial balances from here on. Drafts are
    /// deleted, not voided.
    pub fn void(&mut self, reason: impl Into<String>) -> LedgerResult<()> {
        match self.status {
            EntryStatus::Confirmed => {
                self.status = EntryStatus::Voided;
                self.void_reason = Some(reason.into());
                Ok(())
            }
            EntryStatus::Draft => Err(LedgerError::invalid_state(
                "draft entries are deleted, not voided",
            )),
            EntryStatus::Voided => Err(LedgerError::invalid_state("entry is already voided")),
        }
    }

    /// Store-side: record that a mutation was persisted.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }
}

impl Entity for JournalEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use std::collections::HashMap;

    struct MapDirectory(HashMap<AccountId, Account>);

    impl AccountDirectory for MapDirectory {
        fn get(&self, id: AccountId) -> Option<Account> {
            self.0.get(&id).cloned()
        }
    }

    fn directory_with(accounts: &[(AccountId, &str, bool)]) -> MapDirectory {
        MapDirectory(
            accounts
                .iter()
                .map(|(id, code, imputable)| {
                    (
                        *id,
                        Account {
                            id: *id,
                            code: code.to_string(),
                            name: code.to_string(),
                            imputable: *imputable,
                        },
                    )
                })
                .collect(),
        )
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn draft_with_lines(lines: &[(AccountId, i64, i64)]) -> JournalEntry {
        let mut entry =
            JournalEntry::new_draft(1, test_date(), "Venta mostrador", EntryType::Daily).unwrap();
        for (account_id, debit, credit) in lines {
            entry
                .add_line(Movement::new(*account_id, *debit, *credit, None))
                .unwrap();
        }
        entry
    }

    #[test]
    fn blank_description_is_rejected_at_creation() {
        let err = JournalEntry::new_draft(1, test_date(), "   ", EntryType::Daily).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn balanced_entry_confirms() {
        let caja = AccountId::new();
        let ventas = AccountId::new();
        let dir = directory_with(&[(caja, "1.1.01", true), (ventas, "4.1.01", true)]);

        let mut entry = draft_with_lines(&[(caja, 1000, 0), (ventas, 0, 1000)]);
        entry.confirm(&dir).unwrap();
        assert_eq!(entry.status(), EntryStatus::Confirmed);
    }

    #[test]
    fn unbalanced_entry_stays_draft_with_both_totals() {
        let caja = AccountId::new();
        let ventas = AccountId::new();
        let dir = directory_with(&[(caja, "1.1.01", true), (ventas, "4.1.01", true)]);

        let mut entry = draft_with_lines(&[(caja, 100, 0), (ventas, 0, 90)]);
        let err = entry.confirm(&dir).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Unbalanced {
                debit_total: 100,
                credit_total: 90
            }
        );
        assert_eq!(err.difference(), 10);
        assert_eq!(entry.status(), EntryStatus::Draft);
    }

    #[test]
    fn single_line_entry_fails_structure_even_when_balanced() {
        // A lone zero-sum is impossible anyway, but even a would-be balanced
        // pair collapsed into one line must be rejected on line count.
        let caja = AccountId::new();
        let dir = directory_with(&[(caja, "1.1.01", true)]);
        let mut entry = draft_with_lines(&[(caja, 100, 0)]);
        let err = entry.confirm(&dir).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn non_imputable_account_is_rejected_at_confirm() {
        let caja = AccountId::new();
        let rubro = AccountId::new();
        let dir = directory_with(&[(caja, "1.1.01", true), (rubro, "1.1", false)]);

        let mut entry = draft_with_lines(&[(caja, 100, 0), (rubro, 0, 100)]);
        let err = entry.confirm(&dir).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn confirmed_entry_rejects_every_edit() {
        let caja = AccountId::new();
        let ventas = AccountId::new();
        let dir = directory_with(&[(caja, "1.1.01", true), (ventas, "4.1.01", true)]);

        let mut entry = draft_with_lines(&[(caja, 1000, 0), (ventas, 0, 1000)]);
        let line_id = entry.lines()[0].id;
        entry.confirm(&dir).unwrap();

        assert!(matches!(
            entry.add_line(Movement::new(caja, 1, 0, None)),
            Err(LedgerError::InvalidState(_))
        ));
        assert!(matches!(
            entry.remove_line(line_id),
            Err(LedgerError::InvalidState(_))
        ));
        assert!(matches!(
            entry.set_date(test_date()),
            Err(LedgerError::InvalidState(_))
        ));
        assert!(matches!(
            entry.set_description("x"),
            Err(LedgerError::InvalidState(_))
        ));
        assert!(matches!(
            entry.confirm(&dir),
            Err(LedgerError::InvalidState(_))
        ));
    }

    #[test]
    fn void_requires_confirmed_and_is_terminal() {
        let caja = AccountId::new();
        let ventas = AccountId::new();
        let dir = directory_with(&[(caja, "1.1.01", true), (ventas, "4.1.01", true)]);

        let mut draft = draft_with_lines(&[(caja, 10, 0), (ventas, 0, 10)]);
        assert!(matches!(
            draft.void("typo"),
            Err(LedgerError::InvalidState(_))
        ));

        draft.confirm(&dir).unwrap();
        draft.void("duplicate posting").unwrap();
        assert_eq!(draft.status(), EntryStatus::Voided);
        assert_eq!(draft.void_reason(), Some("duplicate posting"));

        // Terminal: no second void, no edits, no confirm.
        assert!(matches!(
            draft.void("again"),
            Err(LedgerError::InvalidState(_))
        ));
        assert!(matches!(
            draft.confirm(&dir),
            Err(LedgerError::InvalidState(_))
        ));
    }

    #[test]
    fn malformed_movements_never_enter_a_draft() {
        let caja = AccountId::new();
        let mut entry =
            JournalEntry::new_draft(1, test_date(), "test", EntryType::Daily).unwrap();

        for (debit, credit) in [(0, 0), (10, 10), (-1, 0), (0, -1)] {
            let err = entry
                .add_line(Movement::new(caja, debit, credit, None))
                .unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }
        assert!(entry.lines().is_empty());
    }

    #[test]
    fn draft_may_transiently_drop_below_two_lines() {
        let caja = AccountId::new();
        let ventas = AccountId::new();
        let mut entry = draft_with_lines(&[(caja, 10, 0), (ventas, 0, 10)]);
        let first = entry.lines()[0].id;
        entry.remove_line(first).unwrap();
        assert_eq!(entry.lines().len(), 1);

        let missing = entry.remove_line(first).unwrap_err();
        assert_eq!(missing, LedgerError::NotFound);
    }
}
