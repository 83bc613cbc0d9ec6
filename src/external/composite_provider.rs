use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::warn;

use crate::services::failure_cache::{FailureCache, FailureType};
use crate::services::rate_limiter::RateLimiter;

use super::price_provider::{
    ExternalPricePoint, ExternalQuote, PriceProvider, PriceProviderError,
};

const RETRY_ATTEMPTS: u32 = 5;
const RETRY_BASE_DELAY_MS: u64 = 2_000;

/// Primary-with-fallback price provider: tries `primary` (the free CSV
/// source) first, falls back to `fallback` (the JSON quote API) on any
/// error other than a cached recent failure. Transient errors on either
/// provider are retried with exponential backoff per spec.md section 7
/// before the provider gives up and the other is tried.
pub struct CompositeProvider {
    primary: Box<dyn PriceProvider>,
    fallback: Box<dyn PriceProvider>,
    failure_cache: FailureCache,
    rate_limiter: RateLimiter,
}

impl CompositeProvider {
    pub fn new(
        primary: Box<dyn PriceProvider>,
        fallback: Box<dyn PriceProvider>,
        failure_cache: FailureCache,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            primary,
            fallback,
            failure_cache,
            rate_limiter,
        }
    }

    async fn fetch_with_retry(
        provider: &dyn PriceProvider,
        ticker: &str,
        days: u32,
        rate_limiter: &RateLimiter,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut last_err = PriceProviderError::BadResponse("no attempts made".to_string());

        for attempt in 0..RETRY_ATTEMPTS {
            let _permit = rate_limiter.acquire().await;
            match provider.fetch_daily_history(ticker, days).await {
                Ok(points) => return Ok(points),
                Err(PriceProviderError::NotFound) => return Err(PriceProviderError::NotFound),
                Err(err) => {
                    last_err = err;
                    if attempt + 1 < RETRY_ATTEMPTS {
                        warn!(ticker, attempt, error = %last_err, "price fetch failed, retrying after backoff");
                        sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }
        Err(last_err)
    }

    async fn fetch_quote_with_retry(
        provider: &dyn PriceProvider,
        ticker: &str,
        rate_limiter: &RateLimiter,
    ) -> Result<ExternalQuote, PriceProviderError> {
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut last_err = PriceProviderError::BadResponse("no attempts made".to_string());

        for attempt in 0..RETRY_ATTEMPTS {
            let _permit = rate_limiter.acquire().await;
            match provider.fetch_quote(ticker).await {
                Ok(quote) => return Ok(quote),
                Err(PriceProviderError::NotFound) => return Err(PriceProviderError::NotFound),
                Err(err) => {
                    last_err = err;
                    if attempt + 1 < RETRY_ATTEMPTS {
                        warn!(ticker, attempt, error = %last_err, "quote fetch failed, retrying after backoff");
                        sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }
        Err(last_err)
    }
}

#[async_trait]
impl PriceProvider for CompositeProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        if self.failure_cache.is_failed(ticker).is_some() {
            return Err(PriceProviderError::NotFound);
        }

        match Self::fetch_with_retry(self.primary.as_ref(), ticker, days, &self.rate_limiter).await {
            Ok(points) => {
                self.failure_cache.clear(ticker);
                Ok(points)
            }
            Err(PriceProviderError::NotFound) => {
                match Self::fetch_with_retry(self.fallback.as_ref(), ticker, days, &self.rate_limiter).await {
                    Ok(points) => {
                        self.failure_cache.clear(ticker);
                        Ok(points)
                    }
                    Err(err) => {
                        self.failure_cache.record_failure(ticker, failure_type_for(&err));
                        Err(err)
                    }
                }
            }
            Err(primary_err) => {
                warn!(ticker, error = %primary_err, "primary provider exhausted retries, trying fallback");
                match Self::fetch_with_retry(self.fallback.as_ref(), ticker, days, &self.rate_limiter).await {
                    Ok(points) => {
                        self.failure_cache.clear(ticker);
                        Ok(points)
                    }
                    Err(err) => {
                        self.failure_cache.record_failure(ticker, failure_type_for(&err));
                        Err(err)
                    }
                }
            }
        }
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<ExternalQuote, PriceProviderError> {
        if self.failure_cache.is_failed(ticker).is_some() {
            return Err(PriceProviderError::NotFound);
        }

        match Self::fetch_quote_with_retry(self.primary.as_ref(), ticker, &self.rate_limiter).await {
            Ok(quote) => {
                self.failure_cache.clear(ticker);
                Ok(quote)
            }
            Err(PriceProviderError::NotFound) => {
                match Self::fetch_quote_with_retry(self.fallback.as_ref(), ticker, &self.rate_limiter).await {
                    Ok(quote) => {
                        self.failure_cache.clear(ticker);
                        Ok(quote)
                    }
                    Err(err) => {
                        self.failure_cache.record_failure(ticker, failure_type_for(&err));
                        Err(err)
                    }
                }
            }
            Err(primary_err) => {
                warn!(ticker, error = %primary_err, "primary provider exhausted retries, trying fallback");
                match Self::fetch_quote_with_retry(self.fallback.as_ref(), ticker, &self.rate_limiter).await {
                    Ok(quote) => {
                        self.failure_cache.clear(ticker);
                        Ok(quote)
                    }
                    Err(err) => {
                        self.failure_cache.record_failure(ticker, failure_type_for(&err));
                        Err(err)
                    }
                }
            }
        }
    }
}

fn failure_type_for(err: &PriceProviderError) -> FailureType {
    match err {
        PriceProviderError::NotFound => FailureType::NotFound,
        PriceProviderError::RateLimited => FailureType::RateLimited,
        _ => FailureType::ApiError,
    }
}
