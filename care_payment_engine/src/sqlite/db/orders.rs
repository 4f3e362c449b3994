use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderDoc, OrderId},
    traits::LedgerError,
};

/// Stores the snapshot in the mirror, inserting or updating as needed. Returns the stored row and `true` when
/// the order was newly inserted. The engine-owned `commission_posted` column is never touched by an update.
pub async fn upsert_order(doc: OrderDoc, conn: &mut SqliteConnection) -> Result<(Order, bool), LedgerError> {
    let result = match fetch_order_by_order_id(&doc.order_id, conn).await? {
        Some(_) => {
            let order = update_order(doc, conn).await?;
            (order, false)
        },
        None => {
            let order = insert_order(doc, conn).await?;
            debug!("📝️ Order {} inserted with id {}", order.order_id, order.id);
            (order, true)
        },
    };
    Ok(result)
}

/// Inserts a new order into the mirror. Not atomic on its own; embed the call inside a transaction and pass
/// `&mut *tx` as the connection argument if atomicity with other writes is needed.
async fn insert_order(doc: OrderDoc, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                user_id,
                nurse_id,
                status,
                payment_method,
                total_price,
                discount_amount,
                final_price,
                commission_rate,
                coupon_code,
                nurse_moving_confirmed,
                nurse_moving_requested,
                patient_confirmed_nurse_moving,
                payment_confirmed_by_nurse,
                payment_confirmed_by_patient,
                can_cancel_after_accept,
                cancellation_available_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *;
        "#,
    )
    .bind(doc.order_id)
    .bind(doc.user_id)
    .bind(doc.nurse_id)
    .bind(doc.status)
    .bind(doc.payment_method)
    .bind(doc.total_price)
    .bind(doc.discount_amount)
    .bind(doc.final_price)
    .bind(doc.commission_rate)
    .bind(doc.coupon_code)
    .bind(doc.nurse_moving_confirmed)
    .bind(doc.nurse_moving_requested)
    .bind(doc.patient_confirmed_nurse_moving)
    .bind(doc.payment_confirmed_by_nurse)
    .bind(doc.payment_confirmed_by_patient)
    .bind(doc.can_cancel_after_accept)
    .bind(doc.cancellation_available_at)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

async fn update_order(doc: OrderDoc, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    let order_id = doc.order_id.clone();
    sqlx::query(
        r#"
            UPDATE orders SET
                user_id = $2,
                nurse_id = $3,
                status = $4,
                payment_method = $5,
                total_price = $6,
                discount_amount = $7,
                final_price = $8,
                commission_rate = $9,
                coupon_code = $10,
                nurse_moving_confirmed = $11,
                nurse_moving_requested = $12,
                patient_confirmed_nurse_moving = $13,
                payment_confirmed_by_nurse = $14,
                payment_confirmed_by_patient = $15,
                can_cancel_after_accept = $16,
                cancellation_available_at = $17
            WHERE order_id = $1
        "#,
    )
    .bind(&doc.order_id)
    .bind(doc.user_id)
    .bind(doc.nurse_id)
    .bind(doc.status)
    .bind(doc.payment_method)
    .bind(doc.total_price)
    .bind(doc.discount_amount)
    .bind(doc.final_price)
    .bind(doc.commission_rate)
    .bind(doc.coupon_code)
    .bind(doc.nurse_moving_confirmed)
    .bind(doc.nurse_moving_requested)
    .bind(doc.patient_confirmed_nurse_moving)
    .bind(doc.payment_confirmed_by_nurse)
    .bind(doc.payment_confirmed_by_patient)
    .bind(doc.can_cancel_after_accept)
    .bind(doc.cancellation_available_at)
    .execute(&mut *conn)
    .await?;
    // Refetch rather than RETURNING so the row reflects the updated_at trigger.
    fetch_order_by_order_id(&order_id, conn).await?.ok_or(LedgerError::OrderNotFound(order_id))
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Reads the idempotency marker. `None` means the order is not in the mirror at all.
pub async fn commission_posted(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<bool>, sqlx::Error> {
    let posted = sqlx::query_scalar("SELECT commission_posted FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(posted)
}

pub async fn mark_commission_posted(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET commission_posted = 1 WHERE order_id = $1")
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}
