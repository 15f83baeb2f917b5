//! Balance de Sumas y Saldos: per-account sums and residual balances.
//!
//! Derived data, never persisted; recomputed on every query from confirmed
//! entries only. The date-range scan is the store's job
//! (`partida-infra`); the fold here is pure.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use partida_core::{AccountId, LedgerError, LedgerResult};

use crate::account::AccountDirectory;
use crate::entry::{EntryStatus, JournalEntry};

/// One row of the trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_id: AccountId,
    pub account_code: String,
    pub account_name: String,
    pub debit_total: i64,
    pub credit_total: i64,
    /// max(debit_total - credit_total, 0)
    pub debtor_balance: i64,
    /// max(credit_total - debit_total, 0)
    pub creditor_balance: i64,
}

/// Fold confirmed entries into trial-balance rows, ordered by account code
/// ascending. Accounts with no activity are simply absent (no zero rows).
///
/// Non-confirmed entries in the input are skipped, so a caller that already
/// filtered by status pays nothing and a caller that didn't stays correct.
pub fn trial_balance_rows<'a>(
    entries: impl IntoIterator<Item = &'a JournalEntry>,
    directory: &dyn AccountDirectory,
) -> LedgerResult<Vec<TrialBalanceRow>> {
    let mut totals: HashMap<AccountId, (i64, i64)> = HashMap::new();

    for entry in entries {
        if entry.status() != EntryStatus::Confirmed {
            continue;
        }
        for line in entry.lines() {
            let slot = totals.entry(line.account_id).or_insert((0, 0));
            slot.0 = slot
                .0
                .checked_add(line.debit)
                .ok_or_else(|| LedgerError::validation("debit total overflows"))?;
            slot.1 = slot
                .1
                .checked_add(line.credit)
                .ok_or_else(|| LedgerError::validation("credit total overflows"))?;
        }
    }

    let mut rows = Vec::with_capacity(totals.len());
    for (account_id, (debit_total, credit_total)) in totals {
        if debit_total == 0 && credit_total == 0 {
            continue;
        }
        let account = directory.get(account_id).ok_or(LedgerError::NotFound)?;
        rows.push(TrialBalanceRow {
            account_id,
            account_code: account.code,
            account_name: account.name,
            debit_total,
            credit_total,
            debtor_balance: (debit_total - credit_total).max(0),
            creditor_balance: (credit_total - debit_total).max(0),
        });
    }

    rows.sort_by(|a, b| a.account_code.cmp(&b.account_code));
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::entry::{EntryType, Movement};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    struct MapDirectory(HashMap<AccountId, Account>);

    impl AccountDirectory for MapDirectory {
        fn get(&self, id: AccountId) -> Option<Account> {
            self.0.get(&id).cloned()
        }
    }

    fn directory(accounts: &[(AccountId, &str, &str)]) -> MapDirectory {
        MapDirectory(
            accounts
                .iter()
                .map(|(id, code, name)| {
                    (
                        *id,
                        Account {
                            id: *id,
                            code: code.to_string(),
                            name: name.to_string(),
                            imputable: true,
                        },
                    )
                })
                .collect(),
        )
    }

    fn confirmed_entry(
        number: i64,
        dir: &MapDirectory,
        lines: &[(AccountId, i64, i64)],
    ) -> JournalEntry {
        let mut entry = JournalEntry::new_draft(
            number,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            "Venta mostrador",
            EntryType::Daily,
        )
        .unwrap();
        for (account_id, debit, credit) in lines {
            entry
                .add_line(Movement::new(*account_id, *debit, *credit, None))
                .unwrap();
        }
        entry.confirm(dir).unwrap();
        entry
    }

    #[test]
    fn counter_sale_scenario() {
        let caja = AccountId::new();
        let ventas = AccountId::new();
        let dir = directory(&[(caja, "1.1.01", "Caja"), (ventas, "4.1.01", "Ventas")]);

        let entry = confirmed_entry(1, &dir, &[(caja, 1000, 0), (ventas, 0, 1000)]);
        let rows = trial_balance_rows([&entry], &dir).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account_name, "Caja");
        assert_eq!(rows[0].debit_total, 1000);
        assert_eq!(rows[0].debtor_balance, 1000);
        assert_eq!(rows[0].creditor_balance, 0);
        assert_eq!(rows[1].account_name, "Ventas");
        assert_eq!(rows[1].creditor_balance, 1000);

        let total_debit: i64 = rows.iter().map(|r| r.debit_total).sum();
        let total_credit: i64 = rows.iter().map(|r| r.credit_total).sum();
        assert_eq!(total_debit, 1000);
        assert_eq!(total_credit, 1000);
    }

    #[test]
    fn rows_are_sorted_by_account_code() {
        let zeta = AccountId::new();
        let alfa = AccountId::new();
        let dir = directory(&[(zeta, "5.9", "Zeta"), (alfa, "1.1", "Alfa")]);

        let entry = confirmed_entry(1, &dir, &[(zeta, 50, 0), (alfa, 0, 50)]);
        let rows = trial_balance_rows([&entry], &dir).unwrap();
        assert_eq!(rows[0].account_code, "1.1");
        assert_eq!(rows[1].account_code, "5.9");
    }

    #[test]
    fn non_confirmed_entries_are_skipped() {
        let caja = AccountId::new();
        let ventas = AccountId::new();
        let dir = directory(&[(caja, "1.1.01", "Caja"), (ventas, "4.1.01", "Ventas")]);

        let mut draft = JournalEntry::new_draft(
            1,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            "draft",
            EntryType::Daily,
        )
        .unwrap();
        draft
            .add_line(Movement::new(caja, 500, 0, None))
            .unwrap();
        draft
            .add_line(Movement::new(ventas, 0, 500, None))
            .unwrap();

        let mut voided = confirmed_entry(2, &dir, &[(caja, 300, 0), (ventas, 0, 300)]);
        voided.void("duplicate").unwrap();

        let rows = trial_balance_rows([&draft, &voided], &dir).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn netting_produces_one_sided_residuals() {
        let caja = AccountId::new();
        let ventas = AccountId::new();
        let dir = directory(&[(caja, "1.1.01", "Caja"), (ventas, "4.1.01", "Ventas")]);

        // 1000 in, 400 back out of Caja.
        let sale = confirmed_entry(1, &dir, &[(caja, 1000, 0), (ventas, 0, 1000)]);
        let refund = confirmed_entry(2, &dir, &[(ventas, 400, 0), (caja, 0, 400)]);

        let rows = trial_balance_rows([&sale, &refund], &dir).unwrap();
        let caja_row = rows.iter().find(|r| r.account_id == caja).unwrap();
        assert_eq!(caja_row.debit_total, 1000);
        assert_eq!(caja_row.credit_total, 400);
        assert_eq!(caja_row.debtor_balance, 600);
        assert_eq!(caja_row.creditor_balance, 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: because every contributing entry individually balances,
        /// Σ debit_total == Σ credit_total across the returned rows.
        #[test]
        fn aggregate_debits_equal_aggregate_credits(
            amounts in prop::collection::vec(1i64..1_000_000i64, 1..12),
        ) {
            let accounts: Vec<AccountId> = (0..4).map(|_| AccountId::new()).collect();
            let dir = MapDirectory(
                accounts
                    .iter()
                    .enumerate()
                    .map(|(i, id)| {
                        (
                            *id,
                            Account {
                                id: *id,
                                code: format!("{i}.0"),
                                name: "acct".to_string(),
                                imputable: true,
                            },
                        )
                    })
                    .collect(),
            );

            let entries: Vec<JournalEntry> = amounts
                .iter()
                .enumerate()
                .map(|(i, amount)| {
                    let debit_acct = accounts[i % accounts.len()];
                    let credit_acct = accounts[(i + 1) % accounts.len()];
                    confirmed_entry(
                        i as i64 + 1,
                        &dir,
                        &[(debit_acct, *amount, 0), (credit_acct, 0, *amount)],
                    )
                })
                .collect();

            let rows = trial_balance_rows(entries.iter(), &dir).unwrap();
            let total_debit: i64 = rows.iter().map(|r| r.debit_total).sum();
            let total_credit: i64 = rows.iter().map(|r| r.credit_total).sum();
            prop_assert_eq!(total_debit, total_credit);
        }
    }
}
