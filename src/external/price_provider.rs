use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ExternalPricePoint {
    pub date: NaiveDate,
    pub open: BigDecimal,
    pub high: BigDecimal,
    pub low: BigDecimal,
    pub close: BigDecimal,
    pub volume: f64,
}

/// A provider's latest-quote response: the current traded price plus the
/// prior session's close, the pair spec.md section 6 names for
/// `getLatestQuote(id)`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExternalQuote {
    pub price: BigDecimal,
    pub prev_close: BigDecimal,
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("ticker not found")]
    NotFound,
}

/// The capability set spec.md section 6 enumerates for a price adapter:
/// a historical daily series and a latest quote. The aggregator/
/// orchestrator depend only on this trait, never on a concrete provider.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError>;

    async fn fetch_quote(&self, ticker: &str) -> Result<ExternalQuote, PriceProviderError>;
}
