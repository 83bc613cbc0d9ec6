use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::models::event::MarketEvent;

/// Events in the next `horizon_days`, across all instruments unless
/// `instrument_id` narrows it to one.
pub async fn get_upcoming(pool: &PgPool, instrument_id: Option<&str>, horizon_days: i64) -> Result<Vec<MarketEvent>, sqlx::Error> {
    let horizon = Utc::now().date_naive() + Duration::days(horizon_days);
    match instrument_id {
        Some(id) => {
            sqlx::query_as::<_, MarketEvent>(
                "SELECT instrument_id, date, description, importance FROM market_events \
                 WHERE instrument_id = $1 AND date >= CURRENT_DATE AND date <= $2 ORDER BY date",
            )
            .bind(id)
            .bind(horizon)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, MarketEvent>(
                "SELECT instrument_id, date, description, importance FROM market_events \
                 WHERE date >= CURRENT_DATE AND date <= $1 ORDER BY date",
            )
            .bind(horizon)
            .fetch_all(pool)
            .await
        }
    }
}
