//! Request/response shapes for the HTTP boundary.
//!
//! Amounts are i64 in the smallest currency unit; dates are ISO-8601 calendar
//! dates. Responses are built explicitly so the wire contract stays stable
//! independently of domain struct layout.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use partida_core::AccountId;
use partida_infra::{EntrySummary, NewMovement};
use partida_ledger::{EntryType, JournalEntry, Movement, TrialBalanceRow};

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub date: NaiveDate,
    pub description: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub lines: Vec<MovementRequest>,
}

#[derive(Debug, Deserialize)]
pub struct MovementRequest {
    pub account_id: Uuid,
    #[serde(default)]
    pub debit: i64,
    #[serde(default)]
    pub credit: i64,
    pub memo: Option<String>,
}

impl MovementRequest {
    pub fn into_new_movement(self) -> NewMovement {
        NewMovement {
            account_id: AccountId::from_uuid(self.account_id),
            debit: self.debit,
            credit: self.credit,
            memo: self.memo,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDraftRequest {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoidRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct TrialBalanceQuery {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

pub fn movement_to_json(movement: &Movement) -> Value {
    json!({
        "id": movement.id,
        "account_id": movement.account_id,
        "debit": movement.debit,
        "credit": movement.credit,
        "memo": movement.memo,
    })
}

pub fn entry_to_json(entry: &JournalEntry) -> Value {
    json!({
        "id": entry.id_typed(),
        "number": entry.number(),
        "date": entry.date(),
        "description": entry.description(),
        "type": entry.entry_type(),
        "status": entry.status(),
        "void_reason": entry.void_reason(),
        "lines": entry.lines().iter().map(movement_to_json).collect::<Vec<_>>(),
    })
}

pub fn summary_to_json(summary: &EntrySummary) -> Value {
    json!({
        "id": summary.id,
        "number": summary.number,
        "date": summary.date,
        "description": summary.description,
        "type": summary.entry_type,
        "status": summary.status,
        "debit_total": summary.debit_total,
        "credit_total": summary.credit_total,
    })
}

pub fn trial_balance_row_to_json(row: &TrialBalanceRow) -> Value {
    json!({
        "account_id": row.account_id,
        "account_code": row.account_code,
        "account_name": row.account_name,
        "debit_total": row.debit_total,
        "credit_total": row.credit_total,
        "debtor_balance": row.debtor_balance,
        "creditor_balance": row.creditor_balance,
    })
}
