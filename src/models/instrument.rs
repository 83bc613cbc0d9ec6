use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Market an instrument trades on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum Market {
    #[serde(rename = "JP")]
    Jp,
    #[serde(rename = "US")]
    Us,
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Market::Jp => write!(f, "JP"),
            Market::Us => write!(f, "US"),
        }
    }
}

impl TryFrom<String> for Market {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "JP" => Ok(Market::Jp),
            "US" => Ok(Market::Us),
            other => Err(format!("unknown market: {}", other)),
        }
    }
}

/// Asset type of an instrument.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum AssetType {
    #[serde(rename = "stock")]
    Stock,
    #[serde(rename = "etf")]
    Etf,
    #[serde(rename = "mutual_fund")]
    MutualFund,
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Stock => write!(f, "stock"),
            AssetType::Etf => write!(f, "etf"),
            AssetType::MutualFund => write!(f, "mutual_fund"),
        }
    }
}

impl TryFrom<String> for AssetType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "stock" => Ok(AssetType::Stock),
            "etf" => Ok(AssetType::Etf),
            "mutual_fund" => Ok(AssetType::MutualFund),
            other => Err(format!("unknown asset type: {}", other)),
        }
    }
}

/// An equity or fund tracked by the engine.
///
/// Immutable after creation except for `active`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Instrument {
    pub id: String,
    pub display_name: String,
    #[sqlx(try_from = "String")]
    pub market: Market,
    #[sqlx(try_from = "String")]
    pub asset_type: AssetType,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_round_trips_through_string() {
        assert_eq!(Market::try_from("JP".to_string()).unwrap(), Market::Jp);
        assert_eq!(Market::try_from("US".to_string()).unwrap(), Market::Us);
        assert!(Market::try_from("EU".to_string()).is_err());
    }

    #[test]
    fn asset_type_round_trips_through_string() {
        assert_eq!(AssetType::try_from("etf".to_string()).unwrap(), AssetType::Etf);
        assert!(AssetType::try_from("bond".to_string()).is_err());
    }
}
