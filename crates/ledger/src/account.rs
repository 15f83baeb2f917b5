//! Accounts and the read-only directory the ledger posts against.

use serde::{Deserialize, Serialize};

use partida_core::AccountId;

/// Account metadata as supplied by the external chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub code: String, // e.g. "1.1.01"
    pub name: String, // e.g. "Caja"
    /// Leaf account that can receive postings. Summary/grouping accounts
    /// carry `false` and are rejected by structural validation.
    pub imputable: bool,
}

/// Read-only lookup into the external account directory.
///
/// The ledger core consumes this and never mutates it; chart-of-accounts
/// management is someone else's job.
pub trait AccountDirectory: Send + Sync {
    /// Look up an account by id.
    fn get(&self, id: AccountId) -> Option<Account>;

    /// Whether the account exists and accepts postings.
    fn is_imputable(&self, id: AccountId) -> bool {
        self.get(id).map(|a| a.imputable).unwrap_or(false)
    }
}
