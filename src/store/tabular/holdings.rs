use bigdecimal::BigDecimal;
use sqlx::PgPool;

use crate::models::holding::Holding;

pub async fn get_all(pool: &PgPool) -> Result<Vec<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        "SELECT instrument_id, account_class, quantity, avg_cost, current_price, \
         market_value, unrealized_pnl, currency, updated_at FROM holdings",
    )
    .fetch_all(pool)
    .await
}

/// The set of instrument ids currently held, used by the aggregator's
/// `isHolding` flag.
pub async fn get_holding_instrument_ids(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT DISTINCT instrument_id FROM holdings")
        .fetch_all(pool)
        .await
}

/// Atomically recomputes `market_value` and `unrealized_pnl` server-side,
/// mirroring `Holding::set_current_price` so both paths can never drift.
pub async fn update_price(pool: &PgPool, instrument_id: &str, price: &BigDecimal) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE holdings SET current_price = $2, \
         market_value = quantity * $2, \
         unrealized_pnl = quantity * ($2 - avg_cost), \
         updated_at = now() \
         WHERE instrument_id = $1",
    )
    .bind(instrument_id)
    .bind(price)
    .execute(pool)
    .await?;
    Ok(())
}
