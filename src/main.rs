mod aggregator;
mod app;
mod config;
mod errors;
mod external;
mod gate;
mod indicators;
mod jobs;
mod logging;
mod models;
mod routes;
mod services;
mod signals;
mod state;
mod store;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio_cron_scheduler::JobScheduler;

use crate::config::Config;
use crate::external::composite_provider::CompositeProvider;
use crate::external::csv_provider::CsvPriceProvider;
use crate::external::fund_scraper::FundPriceScraper;
use crate::external::json_provider::JsonPriceProvider;
use crate::external::message_transport::{HttpPushTransport, MessageTransport};
use crate::external::price_provider::PriceProvider;
use crate::logging::LoggingConfig;
use crate::services::failure_cache::FailureCache;
use crate::services::rate_limiter::RateLimiter;
use crate::state::AppState;
use crate::store::kv::redis_store::RedisKvStore;
use crate::store::kv::KvStore;

const MAX_CONCURRENT_REQUESTS: usize = 3;
const REQUESTS_PER_MINUTE: u32 = 8;

fn build_price_provider(config: &Config) -> Arc<dyn PriceProvider> {
    let csv: Box<dyn PriceProvider> = Box::new(CsvPriceProvider::new(config.csv_provider_base_url.clone()));
    let json: Box<dyn PriceProvider> = Box::new(JsonPriceProvider::new(
        config.json_provider_base_url.clone(),
        config.json_provider_api_key.clone(),
    ));
    let fund: Box<dyn PriceProvider> = Box::new(FundPriceScraper::new(
        config.fund_scraper_base_url.clone(),
        config.fund_code_map.clone(),
    ));

    // JSON quote API backstops the CSV source; the fund scraper backstops
    // that in turn for tickers neither free source recognizes (mutual
    // funds, which trade by fund code rather than ticker symbol).
    let json_then_fund: Box<dyn PriceProvider> = Box::new(CompositeProvider::new(
        json,
        fund,
        FailureCache::new(),
        RateLimiter::new(MAX_CONCURRENT_REQUESTS, REQUESTS_PER_MINUTE),
    ));

    Arc::new(CompositeProvider::new(
        csv,
        json_then_fund,
        FailureCache::new(),
        RateLimiter::new(MAX_CONCURRENT_REQUESTS, REQUESTS_PER_MINUTE),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    logging::init_logging(LoggingConfig::from_env())?;

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let price_provider = build_price_provider(&config);
    let transport: Arc<dyn MessageTransport> = Arc::new(HttpPushTransport::new(config.push_endpoint.clone()));
    let kv: Arc<dyn KvStore> = Arc::new(RedisKvStore::connect(&config.redis_url).await?);

    let state = AppState {
        pool,
        price_provider,
        transport,
        kv,
        config: Arc::new(config.clone()),
    };

    let mut scheduler = JobScheduler::new().await?;
    jobs::scheduler::register(&mut scheduler, Arc::new(state.clone())).await?;
    scheduler.start().await?;

    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("stock signal engine listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
