//! Ledger error model.

use thiserror::Error;

/// Result type used across the ledger core.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Unified error taxonomy for the ledger core.
///
/// Every operation returns one of these as a typed result; the core never
/// silently corrects data (no auto-rebalancing, no auto-rounding). Callers
/// map the variants onto their own surface (HTTP codes, field-level UI
/// messages, retry policies).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Structural problem with caller input (empty description, malformed
    /// movement, non-imputable account, inverted date range).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Entry does not balance at confirm time. Carries both totals so the
    /// caller can show exactly how far off the entry is.
    #[error("entry does not balance: debit {debit_total} != credit {credit_total}")]
    Unbalanced { debit_total: i64, credit_total: i64 },

    /// Attempted operation violates the entry lifecycle (editing a confirmed
    /// entry, confirming twice, deleting a non-draft, voiding a draft).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Referenced entry, movement, or account does not exist.
    #[error("not found")]
    NotFound,

    /// Underlying transactional store failed (connection loss, timeout).
    /// Retryable by the caller; the core never retries on its own, to avoid
    /// double-submitting financial postings.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unbalanced(debit_total: i64, credit_total: i64) -> Self {
        Self::Unbalanced {
            debit_total,
            credit_total,
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Signed debit-minus-credit gap for `Unbalanced`; zero otherwise.
    pub fn difference(&self) -> i64 {
        match self {
            Self::Unbalanced {
                debit_total,
                credit_total,
            } => debit_total - credit_total,
            _ => 0,
        }
    }
}
