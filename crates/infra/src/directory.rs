//! In-memory account directory.
//!
//! The chart of accounts is owned elsewhere; this adapter holds a snapshot of
//! it for tests, dev servers, and embedding callers that already have the
//! accounts in hand.

use std::collections::HashMap;
use std::sync::RwLock;

use partida_core::AccountId;
use partida_ledger::{Account, AccountDirectory};

/// In-memory `AccountDirectory` for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    inner: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let directory = Self::new();
        for account in accounts {
            directory.upsert(account);
        }
        directory
    }

    pub fn upsert(&self, account: Account) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(account.id, account);
        }
    }
}

impl AccountDirectory for InMemoryAccountDirectory {
    fn get(&self, id: AccountId) -> Option<Account> {
        let map = self.inner.read().ok()?;
        map.get(&id).cloned()
    }
}
