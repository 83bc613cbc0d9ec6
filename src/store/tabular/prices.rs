use sqlx::PgPool;

use crate::models::ohlcv::OhlcvBar;

/// Insert-or-replace on `(instrument_id, date)`: idempotent so a retried
/// fetch after a tick overlap never produces duplicate rows.
pub async fn insert_daily_price(pool: &PgPool, instrument_id: &str, bar: &OhlcvBar) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO daily_prices (instrument_id, date, open, high, low, close, volume, adjusted_close) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (instrument_id, date) DO UPDATE SET \
         open = EXCLUDED.open, high = EXCLUDED.high, low = EXCLUDED.low, close = EXCLUDED.close, \
         volume = EXCLUDED.volume, adjusted_close = EXCLUDED.adjusted_close",
    )
    .bind(instrument_id)
    .bind(bar.date)
    .bind(bar.open)
    .bind(bar.high)
    .bind(bar.low)
    .bind(bar.close)
    .bind(bar.volume)
    .bind(bar.adjusted_close)
    .execute(pool)
    .await?;
    Ok(())
}

/// Ascending series of the most recent `days` bars.
pub async fn get_daily_prices(pool: &PgPool, instrument_id: &str, days: i64) -> Result<Vec<OhlcvBar>, sqlx::Error> {
    let mut bars = sqlx::query_as::<_, OhlcvBar>(
        "SELECT date, open, high, low, close, volume, adjusted_close FROM daily_prices \
         WHERE instrument_id = $1 ORDER BY date DESC LIMIT $2",
    )
    .bind(instrument_id)
    .bind(days)
    .fetch_all(pool)
    .await?;
    bars.reverse();
    Ok(bars)
}

/// Drops same-day intraday rows (price refreshes that are superseded by
/// the end-of-day close) once the daily bar has been written.
pub async fn cleanup_intraday_prices(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM intraday_prices WHERE captured_at < now() - interval '1 day'",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
