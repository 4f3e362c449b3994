use sqlx::SqliteConnection;

use crate::traits::AccountApiError;

pub async fn set_push_token(user_id: &str, token: &str, conn: &mut SqliteConnection) -> Result<(), AccountApiError> {
    sqlx::query(
        r#"
            INSERT INTO push_tokens (user_id, token) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET token = excluded.token, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(user_id)
    .bind(token)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_push_token(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<String>, AccountApiError> {
    let token = sqlx::query_scalar("SELECT token FROM push_tokens WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(token)
}
