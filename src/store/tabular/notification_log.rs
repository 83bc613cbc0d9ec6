use sqlx::PgPool;

use crate::models::decision::Action;

/// Audit trail for every gate notification attempt, success or failure.
pub async fn insert(
    pool: &PgPool,
    instrument_id: &str,
    action: Action,
    message: &str,
    success: bool,
    error: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO notification_log (instrument_id, action, message, success, error, created_at) \
         VALUES ($1, $2, $3, $4, $5, now())",
    )
    .bind(instrument_id)
    .bind(action)
    .bind(message)
    .bind(success)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}
