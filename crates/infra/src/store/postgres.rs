//! Postgres-backed ledger store.
//!
//! Persists entries and movements in two related tables and enforces the
//! transactional guarantees of the store contract at the database level:
//!
//! - Every multi-row write (entry + movements, line edits + version bump,
//!   cascading delete) runs inside one transaction; a cancelled call drops
//!   the transaction and rolls back.
//! - Sequential numbers come from a counter row updated inside the creating
//!   transaction. The row lock serializes concurrent creates and a rollback
//!   restores the counter, so the sequence is unique, monotonic, and
//!   gap-free.
//! - Lifecycle transitions are conditional updates (`WHERE status = ...`
//!   plus an optional version check), so exactly one of two concurrent
//!   confirmations wins.
//!
//! ## Thread safety
//!
//! `PostgresLedgerStore` is `Send + Sync`; all operations go through the
//! SQLx connection pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use partida_core::{AccountId, EntryId, ExpectedVersion, LedgerError, MovementId};
use partida_ledger::{EntryStatus, EntryType, JournalEntry, Movement};

use super::r#trait::{EntryFilter, EntrySummary, LedgerStore, NewEntry};

/// Schema for the two ledger tables plus the number counter.
///
/// `movements.entry_id` cascades on delete; deletes are only ever issued for
/// Draft parents (`delete_entry` checks status first).
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS journal_entries (
    id UUID PRIMARY KEY,
    number BIGINT NOT NULL UNIQUE,
    date DATE NOT NULL,
    description TEXT NOT NULL,
    entry_type TEXT NOT NULL,
    status TEXT NOT NULL,
    void_reason TEXT,
    version BIGINT NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS movements (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    position INT NOT NULL,
    account_id UUID NOT NULL,
    debit BIGINT NOT NULL,
    credit BIGINT NOT NULL,
    memo TEXT
);

CREATE INDEX IF NOT EXISTS movements_entry_idx ON movements (entry_id);
CREATE INDEX IF NOT EXISTS journal_entries_date_idx ON journal_entries (date, number);

CREATE TABLE IF NOT EXISTS ledger_counters (
    name TEXT PRIMARY KEY,
    last BIGINT NOT NULL
);

INSERT INTO ledger_counters (name, last)
VALUES ('entry_number', 0)
ON CONFLICT (name) DO NOTHING;
"#;

/// Postgres-backed `LedgerStore`.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create tables and seed the number counter if absent. Idempotent.
    pub async fn ensure_schema(&self) -> Result<(), LedgerError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn fetch_entry(&self, entry_id: EntryId) -> Result<JournalEntry, LedgerError> {
        let entry_row = sqlx::query(
            r#"
            SELECT id, number, date, description, entry_type, status, void_reason, version
            FROM journal_entries
            WHERE id = $1
            "#,
        )
        .bind(entry_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_entry", e))?
        .ok_or(LedgerError::NotFound)?;

        let movement_rows = sqlx::query(
            r#"
            SELECT id, account_id, debit, credit, memo
            FROM movements
            WHERE entry_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(entry_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_entry", e))?;

        let mut lines = Vec::with_capacity(movement_rows.len());
        for row in movement_rows {
            lines.push(movement_from_row(&row)?);
        }
        entry_from_row(&entry_row, lines)
    }

    /// Lock the entry row and require Draft status. Returns the current
    /// version.
    async fn lock_draft(
        tx: &mut Transaction<'_, Postgres>,
        entry_id: EntryId,
        action: &str,
    ) -> Result<i64, LedgerError> {
        let row = sqlx::query(
            "SELECT status, version FROM journal_entries WHERE id = $1 FOR UPDATE",
        )
        .bind(entry_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_draft", e))?
        .ok_or(LedgerError::NotFound)?;

        let status: String = row
            .try_get("status")
            .map_err(|e| map_sqlx_error("lock_draft", e))?;
        if status != "draft" {
            return Err(LedgerError::invalid_state(format!(
                "cannot {action}: entry is {status}"
            )));
        }
        row.try_get("version")
            .map_err(|e| map_sqlx_error("lock_draft", e))
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, new, lines), err)]
    async fn create_entry(
        &self,
        new: NewEntry,
        lines: Vec<Movement>,
    ) -> Result<JournalEntry, LedgerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_entry", e))?;

        // Counter row lock serializes allocation; a rollback (including a
        // validation failure below) restores it, keeping the sequence
        // gap-free.
        let number: i64 = sqlx::query(
            "UPDATE ledger_counters SET last = last + 1 WHERE name = 'entry_number' RETURNING last",
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_entry", e))?
        .try_get("last")
        .map_err(|e| map_sqlx_error("create_entry", e))?;

        let mut entry = JournalEntry::new_draft(number, new.date, new.description, new.entry_type)?;
        for movement in lines {
            entry.add_line(movement)?;
        }

        sqlx::query(
            r#"
            INSERT INTO journal_entries
                (id, number, date, description, entry_type, status, void_reason, version)
            VALUES ($1, $2, $3, $4, $5, $6, NULL, 0)
            "#,
        )
        .bind(entry.id_typed().as_uuid())
        .bind(entry.number())
        .bind(entry.date())
        .bind(entry.description())
        .bind(type_to_str(entry.entry_type()))
        .bind(status_to_str(entry.status()))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_entry", e))?;

        insert_movements(&mut tx, entry.id_typed(), entry.lines(), 0).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_entry", e))?;
        Ok(entry)
    }

    #[instrument(skip(self, movement), fields(entry_id = %entry_id), err)]
    async fn add_movement(
        &self,
        entry_id: EntryId,
        movement: Movement,
    ) -> Result<Movement, LedgerError> {
        movement.check_shape()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("add_movement", e))?;

        Self::lock_draft(&mut tx, entry_id, "add movement").await?;

        let next_position: i64 = sqlx::query(
            "SELECT COALESCE(MAX(position), -1) + 1 AS next FROM movements WHERE entry_id = $1",
        )
        .bind(entry_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("add_movement", e))?
        .try_get::<i32, _>("next")
        .map(i64::from)
        .map_err(|e| map_sqlx_error("add_movement", e))?;

        insert_movements(&mut tx, entry_id, std::slice::from_ref(&movement), next_position)
            .await?;
        bump_version(&mut tx, entry_id).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("add_movement", e))?;
        Ok(movement)
    }

    #[instrument(skip(self), fields(entry_id = %entry_id, movement_id = %movement_id), err)]
    async fn remove_movement(
        &self,
        entry_id: EntryId,
        movement_id: MovementId,
    ) -> Result<(), LedgerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("remove_movement", e))?;

        Self::lock_draft(&mut tx, entry_id, "remove movement").await?;

        let res = sqlx::query("DELETE FROM movements WHERE id = $1 AND entry_id = $2")
            .bind(movement_id.as_uuid())
            .bind(entry_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("remove_movement", e))?;
        if res.rows_affected() == 0 {
            return Err(LedgerError::NotFound);
        }

        bump_version(&mut tx, entry_id).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("remove_movement", e))?;
        Ok(())
    }

    #[instrument(skip(self, description), fields(entry_id = %entry_id), err)]
    async fn update_draft(
        &self,
        entry_id: EntryId,
        date: Option<NaiveDate>,
        description: Option<String>,
    ) -> Result<JournalEntry, LedgerError> {
        if let Some(ref description) = description {
            if description.trim().is_empty() {
                return Err(LedgerError::validation("description must not be empty"));
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_draft", e))?;

        Self::lock_draft(&mut tx, entry_id, "edit").await?;

        sqlx::query(
            r#"
            UPDATE journal_entries
            SET date = COALESCE($2, date),
                description = COALESCE($3, description),
                version = version + 1
            WHERE id = $1
            "#,
        )
        .bind(entry_id.as_uuid())
        .bind(date)
        .bind(description)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_draft", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_draft", e))?;
        self.fetch_entry(entry_id).await
    }

    #[instrument(skip(self), fields(entry_id = %entry_id), err)]
    async fn get_entry(&self, entry_id: EntryId) -> Result<JournalEntry, LedgerError> {
        self.fetch_entry(entry_id).await
    }

    #[instrument(skip(self, filter), err)]
    async fn list_entries(&self, filter: EntryFilter) -> Result<Vec<EntrySummary>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.number, e.date, e.description, e.entry_type, e.status,
                   COALESCE(SUM(m.debit), 0)::BIGINT AS debit_total,
                   COALESCE(SUM(m.credit), 0)::BIGINT AS credit_total
            FROM journal_entries e
            LEFT JOIN movements m ON m.entry_id = e.id
            WHERE ($1::TEXT IS NULL OR e.status = $1)
              AND ($2::DATE IS NULL OR e.date >= $2)
              AND ($3::DATE IS NULL OR e.date <= $3)
            GROUP BY e.id, e.number, e.date, e.description, e.entry_type, e.status
            ORDER BY e.date ASC, e.number ASC
            "#,
        )
        .bind(filter.status.map(status_to_str))
        .bind(filter.date_from)
        .bind(filter.date_to)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_entries", e))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            summaries.push(EntrySummary {
                id: EntryId::from_uuid(get(&row, "id")?),
                number: get(&row, "number")?,
                date: get(&row, "date")?,
                description: get(&row, "description")?,
                entry_type: type_from_str(&get::<String>(&row, "entry_type")?)?,
                status: status_from_str(&get::<String>(&row, "status")?)?,
                debit_total: get(&row, "debit_total")?,
                credit_total: get(&row, "credit_total")?,
            });
        }
        Ok(summaries)
    }

    #[instrument(skip(self), fields(entry_id = %entry_id), err)]
    async fn delete_entry(&self, entry_id: EntryId) -> Result<(), LedgerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_entry", e))?;

        Self::lock_draft(&mut tx, entry_id, "delete").await?;

        // FK cascade removes the movements in the same transaction.
        sqlx::query("DELETE FROM journal_entries WHERE id = $1")
            .bind(entry_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_entry", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_entry", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(entry_id = %entry_id), err)]
    async fn confirm_entry(
        &self,
        entry_id: EntryId,
        expected: ExpectedVersion,
    ) -> Result<JournalEntry, LedgerError> {
        let expected_version: Option<i64> = match expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(v as i64),
        };

        let res = sqlx::query(
            r#"
            UPDATE journal_entries
            SET status = 'confirmed', version = version + 1
            WHERE id = $1 AND status = 'draft'
              AND ($2::BIGINT IS NULL OR version = $2)
            "#,
        )
        .bind(entry_id.as_uuid())
        .bind(expected_version)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("confirm_entry", e))?;

        if res.rows_affected() == 0 {
            return Err(self.diagnose_transition_failure(entry_id, "confirm").await);
        }
        self.fetch_entry(entry_id).await
    }

    #[instrument(skip(self, reason), fields(entry_id = %entry_id), err)]
    async fn void_entry(
        &self,
        entry_id: EntryId,
        reason: String,
    ) -> Result<JournalEntry, LedgerError> {
        let res = sqlx::query(
            r#"
            UPDATE journal_entries
            SET status = 'voided', void_reason = $2, version = version + 1
            WHERE id = $1 AND status = 'confirmed'
            "#,
        )
        .bind(entry_id.as_uuid())
        .bind(reason)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("void_entry", e))?;

        if res.rows_affected() == 0 {
            return Err(self.diagnose_transition_failure(entry_id, "void").await);
        }
        self.fetch_entry(entry_id).await
    }

    #[instrument(skip(self), err)]
    async fn confirmed_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        let entry_rows = sqlx::query(
            r#"
            SELECT id, number, date, description, entry_type, status, void_reason, version
            FROM journal_entries
            WHERE status = 'confirmed' AND date >= $1 AND date <= $2
            ORDER BY date ASC, number ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("confirmed_in_range", e))?;

        let ids: Vec<uuid::Uuid> = entry_rows
            .iter()
            .map(|row| get(row, "id"))
            .collect::<Result<_, _>>()?;

        let movement_rows = sqlx::query(
            r#"
            SELECT id, entry_id, account_id, debit, credit, memo
            FROM movements
            WHERE entry_id = ANY($1)
            ORDER BY entry_id, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("confirmed_in_range", e))?;

        let mut lines_by_entry: std::collections::HashMap<uuid::Uuid, Vec<Movement>> =
            std::collections::HashMap::new();
        for row in &movement_rows {
            let entry_id: uuid::Uuid = get(row, "entry_id")?;
            lines_by_entry
                .entry(entry_id)
                .or_default()
                .push(movement_from_row(row)?);
        }

        let mut entries = Vec::with_capacity(entry_rows.len());
        for row in &entry_rows {
            let id: uuid::Uuid = get(row, "id")?;
            let lines = lines_by_entry.remove(&id).unwrap_or_default();
            entries.push(entry_from_row(row, lines)?);
        }
        Ok(entries)
    }
}

impl PostgresLedgerStore {
    /// A conditional lifecycle update matched zero rows; work out why.
    async fn diagnose_transition_failure(&self, entry_id: EntryId, action: &str) -> LedgerError {
        let row = sqlx::query("SELECT status FROM journal_entries WHERE id = $1")
            .bind(entry_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await;
        match row {
            Ok(None) => LedgerError::NotFound,
            Ok(Some(row)) => match row.try_get::<String, _>("status").as_deref() {
                Ok("draft") if action == "confirm" => LedgerError::invalid_state(
                    "optimistic concurrency check failed: entry changed since it was loaded",
                ),
                Ok("draft") => {
                    LedgerError::invalid_state("draft entries are deleted, not voided")
                }
                Ok("confirmed") => LedgerError::invalid_state("entry is already confirmed"),
                Ok("voided") => LedgerError::invalid_state("entry is voided"),
                Ok(other) => LedgerError::storage(format!("unknown status {other:?}")),
                Err(e) => LedgerError::storage(format!("diagnose {action}: {e}")),
            },
            Err(e) => map_sqlx_error("diagnose_transition_failure", e),
        }
    }
}

async fn insert_movements(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: EntryId,
    movements: &[Movement],
    first_position: i64,
) -> Result<(), LedgerError> {
    for (offset, movement) in movements.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO movements (id, entry_id, position, account_id, debit, credit, memo)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(movement.id.as_uuid())
        .bind(entry_id.as_uuid())
        .bind((first_position + offset as i64) as i32)
        .bind(movement.account_id.as_uuid())
        .bind(movement.debit)
        .bind(movement.credit)
        .bind(movement.memo.as_deref())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_movements", e))?;
    }
    Ok(())
}

async fn bump_version(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: EntryId,
) -> Result<(), LedgerError> {
    sqlx::query("UPDATE journal_entries SET version = version + 1 WHERE id = $1")
        .bind(entry_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("bump_version", e))?;
    Ok(())
}

fn get<'r, T>(row: &'r sqlx::postgres::PgRow, column: &str) -> Result<T, LedgerError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| LedgerError::storage(format!("column {column}: {e}")))
}

fn entry_from_row(
    row: &sqlx::postgres::PgRow,
    lines: Vec<Movement>,
) -> Result<JournalEntry, LedgerError> {
    let version: i64 = get(row, "version")?;
    Ok(JournalEntry::from_parts(
        EntryId::from_uuid(get(row, "id")?),
        get(row, "number")?,
        get(row, "date")?,
        get(row, "description")?,
        type_from_str(&get::<String>(row, "entry_type")?)?,
        status_from_str(&get::<String>(row, "status")?)?,
        get(row, "void_reason")?,
        lines,
        version as u64,
    ))
}

fn movement_from_row(row: &sqlx::postgres::PgRow) -> Result<Movement, LedgerError> {
    Ok(Movement {
        id: MovementId::from_uuid(get(row, "id")?),
        account_id: AccountId::from_uuid(get(row, "account_id")?),
        debit: get(row, "debit")?,
        credit: get(row, "credit")?,
        memo: get(row, "memo")?,
    })
}

fn status_to_str(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Draft => "draft",
        EntryStatus::Confirmed => "confirmed",
        EntryStatus::Voided => "voided",
    }
}

fn status_from_str(s: &str) -> Result<EntryStatus, LedgerError> {
    match s {
        "draft" => Ok(EntryStatus::Draft),
        "confirmed" => Ok(EntryStatus::Confirmed),
        "voided" => Ok(EntryStatus::Voided),
        other => Err(LedgerError::storage(format!("unknown status {other:?}"))),
    }
}

fn type_to_str(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::Opening => "opening",
        EntryType::Daily => "daily",
        EntryType::Adjustment => "adjustment",
        EntryType::Closing => "closing",
    }
}

fn type_from_str(s: &str) -> Result<EntryType, LedgerError> {
    match s {
        "opening" => Ok(EntryType::Opening),
        "daily" => Ok(EntryType::Daily),
        "adjustment" => Ok(EntryType::Adjustment),
        "closing" => Ok(EntryType::Closing),
        other => Err(LedgerError::storage(format!("unknown entry type {other:?}"))),
    }
}

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> LedgerError {
    LedgerError::storage(format!("{operation}: {e}"))
}
