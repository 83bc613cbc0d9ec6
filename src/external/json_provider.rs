use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use std::str::FromStr;

use super::price_provider::{
    ExternalPricePoint, ExternalQuote, PriceProvider, PriceProviderError,
};

/// JSON quote-API fallback, used only when the CSV primary fails (see
/// `CompositeProvider`). Shaped after a typical time-series quote API:
/// `GET {base_url}/time_series?symbol=X&interval=1day&outputsize=N&apikey=K`.
pub struct JsonPriceProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl JsonPriceProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimeSeriesResponse {
    Ok { values: Vec<TimeSeriesValue> },
    Err { code: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuoteResponse {
    Ok { close: String, previous_close: String },
    Err { code: u16, message: String },
}

#[async_trait]
impl PriceProvider for JsonPriceProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let url = format!(
            "{}/time_series?symbol={}&interval=1day&outputsize={}&apikey={}",
            self.base_url, ticker, days, self.api_key
        );
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

        let parsed: TimeSeriesResponse = response
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        match parsed {
            TimeSeriesResponse::Err { code, message } if code == 429 => {
                let _ = message;
                Err(PriceProviderError::RateLimited)
            }
            TimeSeriesResponse::Err { message, .. } => Err(PriceProviderError::BadResponse(message)),
            TimeSeriesResponse::Ok { values } => {
                let mut points = Vec::with_capacity(values.len());
                for v in values {
                    let date = chrono::NaiveDate::parse_from_str(&v.datetime, "%Y-%m-%d")
                        .map_err(|e| PriceProviderError::Parse(e.to_string()))?;
                    let decimal = |field: &str, value: &str| -> Result<BigDecimal, PriceProviderError> {
                        BigDecimal::from_str(value).map_err(|_| {
                            PriceProviderError::Parse(format!("malformed {field} field"))
                        })
                    };
                    let open = decimal("open", &v.open)?;
                    let high = decimal("high", &v.high)?;
                    let low = decimal("low", &v.low)?;
                    let close = decimal("close", &v.close)?;
                    let volume: f64 = v
                        .volume
                        .parse()
                        .map_err(|_| PriceProviderError::Parse("malformed volume field".into()))?;
                    points.push(ExternalPricePoint { date, open, high, low, close, volume });
                }
                if points.is_empty() {
                    return Err(PriceProviderError::NotFound);
                }
                points.sort_by_key(|p| p.date);
                Ok(points)
            }
        }
    }

    /// `GET {base_url}/quote?symbol=X&apikey=K`, a typical quote-API
    /// shape distinct from the time-series endpoint above: `close` is
    /// the latest traded price, `previous_close` the prior session's.
    async fn fetch_quote(&self, ticker: &str) -> Result<ExternalQuote, PriceProviderError> {
        let url = format!("{}/quote?symbol={}&apikey={}", self.base_url, ticker, self.api_key);
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

        let parsed: QuoteResponse = response
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        match parsed {
            QuoteResponse::Err { code, message } if code == 429 => {
                let _ = message;
                Err(PriceProviderError::RateLimited)
            }
            QuoteResponse::Err { message, .. } => Err(PriceProviderError::BadResponse(message)),
            QuoteResponse::Ok { close, previous_close } => Ok(ExternalQuote {
                price: BigDecimal::from_str(&close)
                    .map_err(|_| PriceProviderError::Parse("malformed close field".into()))?,
                prev_close: BigDecimal::from_str(&previous_close)
                    .map_err(|_| PriceProviderError::Parse("malformed previous_close field".into()))?,
            }),
        }
    }
}
