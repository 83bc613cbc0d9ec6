use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::str::FromStr;

use super::price_provider::{
    ExternalPricePoint, ExternalQuote, PriceProvider, PriceProviderError,
};

/// Free daily-granularity CSV quote source (Stooq-shaped: `Date,Open,High,
/// Low,Close,Volume`), the primary price provider per the documented
/// preference for CSV over JSON APIs. No API key required.
pub struct CsvPriceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl CsvPriceProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; StockSignalEngine/0.1)")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into(),
        }
    }
}

impl Default for CsvPriceProvider {
    fn default() -> Self {
        Self::new("https://stooq.com/q/d/l")
    }
}

#[async_trait]
impl PriceProvider for CsvPriceProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let url = format!("{}/?s={}&i=d", self.base_url, ticker.to_lowercase());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!(
                "status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if body.trim().eq_ignore_ascii_case("n/a") || body.trim().is_empty() {
            return Err(PriceProviderError::NotFound);
        }

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(body.as_bytes());
        let mut points = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| PriceProviderError::Parse(e.to_string()))?;
            let column = |idx: usize, name: &str| -> Result<&str, PriceProviderError> {
                record
                    .get(idx)
                    .ok_or_else(|| PriceProviderError::Parse(format!("missing {name} column")))
            };
            let decimal = |idx: usize, name: &str| -> Result<BigDecimal, PriceProviderError> {
                BigDecimal::from_str(column(idx, name)?).map_err(|e| PriceProviderError::Parse(e.to_string()))
            };
            let date = chrono::NaiveDate::parse_from_str(column(0, "date")?, "%Y-%m-%d")
                .map_err(|e| PriceProviderError::Parse(e.to_string()))?;
            let open = decimal(1, "open")?;
            let high = decimal(2, "high")?;
            let low = decimal(3, "low")?;
            let close = decimal(4, "close")?;
            let volume: f64 = column(5, "volume")?
                .parse()
                .map_err(|_| PriceProviderError::Parse("malformed volume column".into()))?;
            points.push(ExternalPricePoint { date, open, high, low, close, volume });
        }

        if points.is_empty() {
            return Err(PriceProviderError::NotFound);
        }

        points.sort_by_key(|p| p.date);
        let keep = (days as usize).min(points.len());
        Ok(points.split_off(points.len() - keep))
    }

    /// The CSV source has no dedicated quote endpoint, so the latest
    /// quote is derived from the same daily series: today's close is the
    /// price, yesterday's close is `prev_close`.
    async fn fetch_quote(&self, ticker: &str) -> Result<ExternalQuote, PriceProviderError> {
        let points = self.fetch_daily_history(ticker, 2).await?;
        let price = points.last().ok_or(PriceProviderError::NotFound)?.close.clone();
        let prev_close = if points.len() >= 2 {
            points[points.len() - 2].close.clone()
        } else {
            price.clone()
        };
        Ok(ExternalQuote { price, prev_close })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_csv_body() {
        let body = "Date,Open,High,Low,Close,Volume\n2026-01-01,100,102,99,101,1000\n2026-01-02,101,103,100,102,1200\n";
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(body.as_bytes());
        let records: Vec<_> = reader.records().collect();
        assert_eq!(records.len(), 2);
    }
}
