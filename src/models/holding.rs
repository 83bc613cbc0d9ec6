use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Currency a holding is denominated in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum Currency {
    #[serde(rename = "JPY")]
    Jpy,
    #[serde(rename = "USD")]
    Usd,
}

impl TryFrom<String> for Currency {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "JPY" => Ok(Currency::Jpy),
            "USD" => Ok(Currency::Usd),
            other => Err(format!("unknown currency: {}", other)),
        }
    }
}

/// A position held in a specific account class.
///
/// `market_value` and `unrealized_pnl` are derived from `quantity`,
/// `current_price` and `avg_cost`; `set_current_price` keeps both in
/// sync so the two can never drift apart.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Holding {
    pub instrument_id: String,
    pub account_class: String,
    pub quantity: BigDecimal,
    pub avg_cost: BigDecimal,
    pub current_price: BigDecimal,
    pub market_value: BigDecimal,
    pub unrealized_pnl: BigDecimal,
    #[sqlx(try_from = "String")]
    pub currency: Currency,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    pub fn new(
        instrument_id: String,
        account_class: String,
        quantity: BigDecimal,
        avg_cost: BigDecimal,
        current_price: BigDecimal,
        currency: Currency,
    ) -> Self {
        let mut holding = Self {
            instrument_id,
            account_class,
            quantity,
            avg_cost,
            current_price: current_price.clone(),
            market_value: BigDecimal::from(0),
            unrealized_pnl: BigDecimal::from(0),
            currency,
            updated_at: Utc::now(),
        };
        holding.set_current_price(current_price);
        holding
    }

    /// Atomically recompute `market_value` and `unrealized_pnl` for a new price.
    pub fn set_current_price(&mut self, price: BigDecimal) {
        self.current_price = price.clone();
        self.market_value = &self.quantity * &price;
        self.unrealized_pnl = &self.quantity * (&price - &self.avg_cost);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn bd(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn derived_fields_recompute_atomically_on_price_update() {
        let mut holding = Holding::new(
            "7203".to_string(),
            "taxable".to_string(),
            bd("100"),
            bd("2000"),
            bd("2100"),
            Currency::Jpy,
        );
        assert_eq!(holding.market_value, bd("210000"));
        assert_eq!(holding.unrealized_pnl, bd("10000"));

        holding.set_current_price(bd("1900"));
        assert_eq!(holding.market_value, bd("190000"));
        assert_eq!(holding.unrealized_pnl, bd("-10000"));
    }
}
