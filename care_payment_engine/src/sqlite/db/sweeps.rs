use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db_types::OrderId;

/// Latches `can_cancel_after_accept` on every accepted order whose window has opened, in one batched write.
/// The predicate is self-limiting: flipped rows drop out of the next run's query.
pub async fn open_cancellation_windows(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderId>, sqlx::Error> {
    let ids: Vec<String> = sqlx::query_scalar(
        r#"
            UPDATE orders
            SET can_cancel_after_accept = 1
            WHERE status = 'Accepted'
              AND can_cancel_after_accept = 0
              AND cancellation_available_at IS NOT NULL
              AND cancellation_available_at <= $1
            RETURNING order_id
        "#,
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(ids.into_iter().map(OrderId::from).collect())
}

/// One page of archival candidates: terminal orders last touched before the cutoff, oldest first.
pub async fn stale_order_ids(
    cutoff: DateTime<Utc>,
    limit: u32,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderId>, sqlx::Error> {
    let ids: Vec<String> = sqlx::query_scalar(
        r#"
            SELECT order_id FROM orders
            WHERE status IN ('Completed', 'Cancelled', 'Rejected')
              AND updated_at <= $1
            ORDER BY updated_at ASC
            LIMIT $2
        "#,
    )
    .bind(cutoff)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(ids.into_iter().map(OrderId::from).collect())
}

/// Copies the given orders into the archive with an `archived_at` stamp. One batched INSERT..SELECT.
pub async fn copy_to_archive(ids: &[OrderId], conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"INSERT INTO order_archive (
            order_id, user_id, nurse_id, status, payment_method,
            total_price, discount_amount, final_price, commission_rate, coupon_code,
            nurse_moving_confirmed, nurse_moving_requested, patient_confirmed_nurse_moving,
            payment_confirmed_by_nurse, payment_confirmed_by_patient, can_cancel_after_accept,
            cancellation_available_at, commission_posted, created_at, updated_at, archived_at
        ) SELECT
            order_id, user_id, nurse_id, status, payment_method,
            total_price, discount_amount, final_price, commission_rate, coupon_code,
            nurse_moving_confirmed, nurse_moving_requested, patient_confirmed_nurse_moving,
            payment_confirmed_by_nurse, payment_confirmed_by_patient, can_cancel_after_accept,
            cancellation_available_at, commission_posted, created_at, updated_at, CURRENT_TIMESTAMP
        FROM orders WHERE order_id IN ("#,
    );
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.as_str());
    }
    qb.push(")");
    let copied = qb.build().execute(conn).await?.rows_affected();
    trace!("🗄️ {copied} orders copied to the archive");
    Ok(copied)
}

/// Deletes the given orders from the live table. One batched DELETE.
pub async fn delete_orders(ids: &[OrderId], conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM orders WHERE order_id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.as_str());
    }
    qb.push(")");
    let deleted = qb.build().execute(conn).await?.rows_affected();
    trace!("🗄️ {deleted} orders deleted from the live table");
    Ok(deleted)
}
