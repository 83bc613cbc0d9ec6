use async_trait::async_trait;
use bigdecimal::BigDecimal;
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;

use super::price_provider::{
    ExternalPricePoint, ExternalQuote, PriceProvider, PriceProviderError,
};

/// Scrapes a mutual-fund price page by fund code. Funds have no ticker
/// symbol the CSV/JSON providers understand, so the caller must supply a
/// curated display-name-to-code mapping (fund families each use their own
/// code scheme, e.g. `FID1234`, `DYN5678`).
pub struct FundPriceScraper {
    client: reqwest::Client,
    base_url: String,
    code_by_display_name: HashMap<String, String>,
}

impl FundPriceScraper {
    pub fn new(base_url: impl Into<String>, code_by_display_name: HashMap<String, String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            code_by_display_name,
        }
    }

    pub fn code_for(&self, display_name: &str) -> Option<&str> {
        self.code_by_display_name.get(display_name).map(String::as_str)
    }

    async fn fetch_page(&self, ticker: &str) -> Result<String, PriceProviderError> {
        let code = self
            .code_by_display_name
            .get(ticker)
            .ok_or(PriceProviderError::NotFound)?;
        let url = format!("{}/fund/{}", self.base_url, code);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!(
                "status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))
    }

    fn parse_nav(html: &str) -> Result<BigDecimal, PriceProviderError> {
        let re = Regex::new(r#"class="nav-price"[^>]*>\s*([0-9]+\.[0-9]+)"#)
            .expect("static regex is valid");
        let captured = re
            .captures(html)
            .and_then(|c| c.get(1))
            .ok_or_else(|| PriceProviderError::Parse("nav price not found in page".to_string()))?;
        BigDecimal::from_str(captured.as_str()).map_err(|e| PriceProviderError::Parse(e.to_string()))
    }

    /// The prior session's NAV, published alongside today's on the same
    /// page. Absent on some fund pages; `fetch_quote` falls back to
    /// today's NAV rather than failing the whole quote.
    fn parse_prev_close(html: &str) -> Option<BigDecimal> {
        let re = Regex::new(r#"class="prev-close"[^>]*>\s*([0-9]+\.[0-9]+)"#).ok()?;
        let captured = re.captures(html).and_then(|c| c.get(1))?;
        BigDecimal::from_str(captured.as_str()).ok()
    }
}

#[async_trait]
impl PriceProvider for FundPriceScraper {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        _days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let html = self.fetch_page(ticker).await?;
        let nav = Self::parse_nav(&html)?;

        // A fund NAV page publishes a single end-of-day price, not an
        // OHLCV bar; open/high/low collapse to the NAV and volume is
        // unknown, unlike the CSV/JSON providers which carry real bars.
        Ok(vec![ExternalPricePoint {
            date: chrono::Utc::now().date_naive(),
            open: nav.clone(),
            high: nav.clone(),
            low: nav.clone(),
            close: nav,
            volume: 0.0,
        }])
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<ExternalQuote, PriceProviderError> {
        let html = self.fetch_page(ticker).await?;
        let nav = Self::parse_nav(&html)?;
        let prev_close = Self::parse_prev_close(&html).unwrap_or_else(|| nav.clone());
        Ok(ExternalQuote { price: nav, prev_close })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_nav_price_from_page_markup() {
        let html = r#"<div><span class="nav-price" data-x="1">12.34</span></div>"#;
        assert_eq!(FundPriceScraper::parse_nav(html).unwrap(), BigDecimal::from_str("12.34").unwrap());
    }

    #[test]
    fn missing_nav_price_is_a_parse_error() {
        let html = "<div>no price here</div>";
        assert!(FundPriceScraper::parse_nav(html).is_err());
    }

    #[test]
    fn extracts_prev_close_when_present() {
        let html = r#"<span class="nav-price">12.34</span><span class="prev-close">12.10</span>"#;
        assert_eq!(FundPriceScraper::parse_prev_close(html), Some(BigDecimal::from_str("12.10").unwrap()));
    }

    #[test]
    fn missing_prev_close_is_none() {
        let html = r#"<span class="nav-price">12.34</span>"#;
        assert_eq!(FundPriceScraper::parse_prev_close(html), None);
    }
}
