use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use sqlx::PgPool;

/// One row per calendar day; insert-or-replace so a retried summary job
/// never produces two snapshots for the same date.
pub async fn save(pool: &PgPool, total_value: &BigDecimal, daily_pnl: &BigDecimal) -> Result<(), sqlx::Error> {
    let today = Utc::now().date_naive();
    let month_start_value = get_month_start_value(pool).await?.unwrap_or_else(|| total_value.clone());
    sqlx::query(
        "INSERT INTO portfolio_snapshots (date, total_value, daily_pnl, month_start_value) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (date) DO UPDATE SET total_value = EXCLUDED.total_value, daily_pnl = EXCLUDED.daily_pnl",
    )
    .bind(today)
    .bind(total_value)
    .bind(daily_pnl)
    .bind(&month_start_value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_month_start_value(pool: &PgPool) -> Result<Option<BigDecimal>, sqlx::Error> {
    sqlx::query_scalar::<_, BigDecimal>(
        "SELECT total_value FROM portfolio_snapshots \
         WHERE date >= date_trunc('month', CURRENT_DATE) ORDER BY date ASC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
}

pub async fn value_on_or_before(pool: &PgPool, date: chrono::NaiveDate) -> Result<Option<BigDecimal>, sqlx::Error> {
    sqlx::query_scalar::<_, BigDecimal>(
        "SELECT total_value FROM portfolio_snapshots WHERE date <= $1 ORDER BY date DESC LIMIT 1",
    )
    .bind(date)
    .fetch_optional(pool)
    .await
}

pub async fn calculate_weekly_pnl(pool: &PgPool, current: &BigDecimal) -> Result<BigDecimal, sqlx::Error> {
    let a_week_ago = Utc::now().date_naive() - Duration::days(7);
    let baseline = value_on_or_before(pool, a_week_ago).await?.unwrap_or_else(|| current.clone());
    Ok(current - baseline)
}

pub async fn calculate_monthly_pnl(pool: &PgPool, current: &BigDecimal) -> Result<BigDecimal, sqlx::Error> {
    let baseline = get_month_start_value(pool).await?.unwrap_or_else(|| current.clone());
    Ok(current - baseline)
}
