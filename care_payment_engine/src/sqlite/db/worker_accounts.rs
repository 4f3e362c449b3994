use cpg_common::Money;
use log::trace;
use sqlx::SqliteConnection;

use crate::{db_types::WorkerAccount, traits::AccountApiError};

pub async fn fetch_worker_account(
    worker_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<WorkerAccount>, AccountApiError> {
    let account = sqlx::query_as("SELECT * FROM worker_accounts WHERE worker_id = $1")
        .bind(worker_id)
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

/// Applies a signed delta to the worker's balance and stamps `last_payout_update`, returning the new balance.
/// Returns `None` when no account exists for the worker. The single UPDATE makes the read-modify-write atomic
/// at the statement level; callers still wrap it in a transaction with the journal insert.
pub async fn adjust_balance(
    worker_id: &str,
    delta: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<Money>, AccountApiError> {
    let new_balance = sqlx::query_scalar(
        r#"
            UPDATE worker_accounts
            SET payout_balance = payout_balance + $1, last_payout_update = CURRENT_TIMESTAMP
            WHERE worker_id = $2
            RETURNING payout_balance
        "#,
    )
    .bind(delta)
    .bind(worker_id)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(balance) = &new_balance {
        trace!("🧑️ Balance for {worker_id} adjusted by {delta} to {balance}");
    }
    Ok(new_balance)
}

/// Idempotent on `worker_id`: registering an existing worker leaves the balance untouched and only refreshes
/// the push token.
pub async fn register_worker_account(
    worker_id: &str,
    fcm_token: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<WorkerAccount, AccountApiError> {
    let account = sqlx::query_as(
        r#"
            INSERT INTO worker_accounts (worker_id, fcm_token) VALUES ($1, $2)
            ON CONFLICT (worker_id) DO UPDATE SET fcm_token = COALESCE(excluded.fcm_token, fcm_token)
            RETURNING *
        "#,
    )
    .bind(worker_id)
    .bind(fcm_token)
    .fetch_one(conn)
    .await?;
    Ok(account)
}
