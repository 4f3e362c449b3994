use sqlx::SqliteConnection;

use crate::{
    db_types::{LedgerEntry, NewLedgerEntry},
    traits::AccountApiError,
};

/// Appends one journal row. Callers are responsible for running this inside the same transaction as the
/// balance mutation it records.
pub async fn insert_entry(entry: NewLedgerEntry, conn: &mut SqliteConnection) -> Result<LedgerEntry, AccountApiError> {
    let currency = entry.currency();
    let row = sqlx::query_as(
        r#"
            INSERT INTO ledger_entries (entry_type, amount, order_id, user_id, currency, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
        "#,
    )
    .bind(entry.entry_type)
    .bind(entry.amount)
    .bind(entry.order_id)
    .bind(entry.user_id)
    .bind(currency)
    .bind(entry.note)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn entries_for_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<LedgerEntry>, AccountApiError> {
    let entries = sqlx::query_as("SELECT * FROM ledger_entries WHERE user_id = $1 ORDER BY id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
