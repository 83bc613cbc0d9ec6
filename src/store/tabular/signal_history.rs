use sqlx::PgPool;

use crate::models::decision::Decision;

/// One row per non-HOLD decision, timestamped at write. Readers must not
/// assume causal ordering across instruments beyond this timestamp.
pub async fn insert(pool: &PgPool, decision: &Decision) -> Result<(), sqlx::Error> {
    let signals_json = serde_json::to_value(&decision.signals).unwrap_or(serde_json::Value::Null);
    sqlx::query(
        "INSERT INTO signal_history \
         (instrument_id, action, confidence, horizon_label, reasons, warnings, signals, generated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&decision.instrument_id)
    .bind(decision.action)
    .bind(decision.confidence)
    .bind(decision.horizon_label as i32)
    .bind(&decision.reasons)
    .bind(&decision.warnings)
    .bind(signals_json)
    .bind(decision.generated_at)
    .execute(pool)
    .await?;
    Ok(())
}
