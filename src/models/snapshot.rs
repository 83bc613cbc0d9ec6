use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One calendar day's portfolio valuation. Weekly and monthly P&L are
/// derived at read time from earlier rows, not stored redundantly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    pub total_value: BigDecimal,
    pub daily_pnl: BigDecimal,
    pub month_start_value: BigDecimal,
}

impl PortfolioSnapshot {
    pub fn month_to_date_pnl(&self) -> BigDecimal {
        &self.total_value - &self.month_start_value
    }
}
