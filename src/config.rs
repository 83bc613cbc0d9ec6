use serde::{Deserialize, Serialize};

/// Aggregator and gate thresholds, overridable via the `config:thresholds`
/// key in the key-value store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdsConfig {
    pub l1_min_probability: f64,
    pub l2_min_probability: f64,
    pub l3_min_sharpe: f64,
    pub cooldown_hours: i64,
    pub hysteresis_buffer: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            l1_min_probability: 0.60,
            l2_min_probability: 0.60,
            l3_min_sharpe: 0.50,
            cooldown_hours: 24,
            hysteresis_buffer: 0.05,
        }
    }
}

/// Process-wide configuration, assembled from the environment the way
/// the teacher's `main` reads `DATABASE_URL` directly. Kept deliberately
/// small: everything that changes per-tick behavior lives in
/// `ThresholdsConfig` inside the kv store instead, so it can be tuned
/// without a restart.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub bind_addr: std::net::SocketAddr,
    pub max_notifications_per_day: u32,
    pub push_token: String,
    pub push_recipient: String,
    pub push_endpoint: String,
    pub loki_url: Option<String>,
    pub csv_provider_base_url: String,
    pub json_provider_base_url: String,
    pub json_provider_api_key: String,
    pub fund_scraper_base_url: String,
    pub fund_code_map: std::collections::HashMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(String),
    #[error("invalid value for {0}: {1}")]
    InvalidVar(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = require_var("DATABASE_URL")?;
        let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let push_token = require_var("PUSH_TOKEN")?;
        let push_recipient = require_var("PUSH_RECIPIENT")?;
        let push_endpoint = require_var("PUSH_ENDPOINT")?;
        let loki_url = std::env::var("LOKI_URL").ok();

        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidVar("BIND_ADDR".to_string(), "not a socket address".to_string()))?;

        let max_notifications_per_day = std::env::var("MAX_NOTIFICATIONS_PER_DAY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50);

        let csv_provider_base_url = std::env::var("CSV_PROVIDER_BASE_URL")
            .unwrap_or_else(|_| "https://stooq.com/q/d/l".to_string());
        let json_provider_base_url = std::env::var("JSON_PROVIDER_BASE_URL")
            .unwrap_or_else(|_| "https://api.twelvedata.com".to_string());
        let json_provider_api_key = std::env::var("JSON_PROVIDER_API_KEY").unwrap_or_default();
        let fund_scraper_base_url = std::env::var("FUND_SCRAPER_BASE_URL")
            .unwrap_or_else(|_| "https://example-fund-portal.test".to_string());
        let fund_code_map = std::env::var("FUND_CODE_MAP")
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        Ok(Self {
            database_url,
            redis_url,
            bind_addr,
            max_notifications_per_day,
            push_token,
            push_recipient,
            push_endpoint,
            loki_url,
            csv_provider_base_url,
            json_provider_base_url,
            json_provider_api_key,
            fund_scraper_base_url,
            fund_code_map,
        })
    }
}

fn require_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}
