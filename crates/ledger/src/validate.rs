//! Pure validation, independent of storage.
//!
//! Invoked by the lifecycle on every Draft → Confirmed transition, and usable
//! eagerly by callers (e.g. a live running balance while editing) with no
//! side effects.

use partida_core::{LedgerError, LedgerResult};

use crate::account::AccountDirectory;
use crate::entry::JournalEntry;

/// Checked debit/credit totals over an entry's lines.
///
/// Amounts are i64 minor units; sums are checked rather than wrapped so a
/// pathological draft surfaces as a validation error, not silent overflow.
pub fn entry_totals(entry: &JournalEntry) -> LedgerResult<(i64, i64)> {
    let mut debit_total: i64 = 0;
    let mut credit_total: i64 = 0;
    for line in entry.lines() {
        debit_total = debit_total
            .checked_add(line.debit)
            .ok_or_else(|| LedgerError::validation("debit total overflows"))?;
        credit_total = credit_total
            .checked_add(line.credit)
            .ok_or_else(|| LedgerError::validation("credit total overflows"))?;
    }
    Ok((debit_total, credit_total))
}

/// Structural checks: non-blank description, at least two movements, each
/// movement one-sided and non-negative, every referenced account imputable.
pub fn validate_structure(
    entry: &JournalEntry,
    directory: &dyn AccountDirectory,
) -> LedgerResult<()> {
    if entry.description().trim().is_empty() {
        return Err(LedgerError::validation("description must not be empty"));
    }
    if entry.lines().len() < 2 {
        return Err(LedgerError::validation(
            "entry must contain at least two movements",
        ));
    }
    for line in entry.lines() {
        line.check_shape()?;
        if !directory.is_imputable(line.account_id) {
            return Err(LedgerError::validation(format!(
                "account {} is not imputable",
                line.account_id
            )));
        }
    }
    Ok(())
}

/// Exact balance check: Σ debit == Σ credit, integer equality, no tolerance.
pub fn validate_balance(entry: &JournalEntry) -> LedgerResult<()> {
    let (debit_total, credit_total) = entry_totals(entry)?;
    if debit_total != credit_total {
        return Err(LedgerError::unbalanced(debit_total, credit_total));
    }
    Ok(())
}
