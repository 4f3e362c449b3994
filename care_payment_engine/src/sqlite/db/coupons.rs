use sqlx::SqliteConnection;

use crate::{db_types::Coupon, traits::AccountApiError};

pub async fn upsert_coupon(code: &str, conn: &mut SqliteConnection) -> Result<(), AccountApiError> {
    sqlx::query("INSERT INTO coupons (code) VALUES ($1) ON CONFLICT (code) DO NOTHING")
        .bind(code)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_coupon(code: &str, conn: &mut SqliteConnection) -> Result<Option<Coupon>, AccountApiError> {
    let coupon = sqlx::query_as("SELECT * FROM coupons WHERE code = $1").bind(code).fetch_optional(conn).await?;
    Ok(coupon)
}

/// Atomic in-place increment. Unknown codes are registered on first use so the count is never lost.
pub async fn increment_used_count(code: &str, conn: &mut SqliteConnection) -> Result<(), AccountApiError> {
    sqlx::query(
        r#"
            INSERT INTO coupons (code, used_count) VALUES ($1, 1)
            ON CONFLICT (code) DO UPDATE SET used_count = used_count + 1
        "#,
    )
    .bind(code)
    .execute(conn)
    .await?;
    Ok(())
}
