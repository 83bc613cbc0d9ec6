use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::jobs::orchestrator::{self, JobSummary};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/test/notify", post(test_notify))
        .route("/admin/initialize", post(initialize))
        .route("/admin/reset-stop", post(reset_stop))
        .route("/admin/trigger", post(trigger))
}

#[derive(Debug, Deserialize)]
struct TestNotifyRequest {
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct TestNotifyResponse {
    sent: bool,
}

/// Sends a fixed diagnostic message straight through the transport,
/// bypassing the gate entirely, so an operator can confirm the push
/// token/recipient/endpoint are wired correctly without waiting for a
/// real BUY/SELL decision.
async fn test_notify(
    State(state): State<AppState>,
    Json(req): Json<TestNotifyRequest>,
) -> Result<Json<TestNotifyResponse>, AppError> {
    let message = req.message.unwrap_or_else(|| "stock signal engine test notification".to_string());
    state
        .transport
        .send_push(&state.config.push_token, &state.config.push_recipient, &message)
        .await
        .map_err(|e| AppError::External(e.to_string()))?;
    info!("POST /test/notify - sent test notification");
    Ok(Json(TestNotifyResponse { sent: true }))
}

#[derive(Debug, Serialize)]
struct InitializeResponse {
    processed: u32,
    skipped: u32,
    failed: u32,
}

/// Backfills historical daily series for every active instrument from
/// the price provider (spec.md section 6), for bringing up a fresh
/// deployment whose instruments have no series yet and would otherwise
/// fail the 60-bar `InsufficientData` floor on the first scheduled tick.
async fn initialize(State(state): State<AppState>) -> Result<Json<InitializeResponse>, AppError> {
    let summary = orchestrator::run_seed_historical_series(&state).await?;
    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        "POST /admin/initialize - seeded historical series"
    );
    Ok(Json(InitializeResponse {
        processed: summary.processed,
        skipped: summary.skipped,
        failed: summary.failed,
    }))
}

#[derive(Debug, Serialize)]
struct ResetStopResponse {
    emergency_stop: bool,
}

/// Clears the emergency stop the gate engages once the daily
/// notification cap is hit (spec.md section 4.4 step 2).
async fn reset_stop(State(state): State<AppState>) -> Json<ResetStopResponse> {
    state.kv.set_emergency_stop(false).await;
    info!("POST /admin/reset-stop - emergency stop cleared");
    Json(ResetStopResponse { emergency_stop: false })
}

#[derive(Debug, Deserialize)]
struct TriggerRequest {
    job: TriggerJob,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum TriggerJob {
    MonitoringTick,
    JpDailySummary,
    UsDailySummary,
    FundRefresh,
    WeeklySummary,
}

#[derive(Debug, Serialize)]
struct TriggerResponse {
    job: &'static str,
    processed: u32,
    skipped: u32,
    failed: u32,
}

/// Runs one named job immediately instead of waiting for its next
/// wall-clock slot, for manual testing or recovering a missed run.
async fn trigger(
    State(state): State<AppState>,
    Json(req): Json<TriggerRequest>,
) -> Result<Json<TriggerResponse>, AppError> {
    let (name, summary): (&'static str, JobSummary) = match req.job {
        TriggerJob::MonitoringTick => ("monitoring_tick", orchestrator::run_monitoring_tick(&state).await?),
        TriggerJob::JpDailySummary => ("jp_daily_summary", orchestrator::run_jp_daily_summary(&state).await?),
        TriggerJob::UsDailySummary => ("us_daily_summary", orchestrator::run_us_daily_summary(&state).await?),
        TriggerJob::FundRefresh => ("fund_refresh", orchestrator::run_fund_price_refresh(&state).await?),
        TriggerJob::WeeklySummary => ("weekly_summary", orchestrator::run_weekly_summary(&state).await?),
    };
    info!(job = name, "POST /admin/trigger - ran job on demand");
    Ok(Json(TriggerResponse {
        job: name,
        processed: summary.processed,
        skipped: summary.skipped,
        failed: summary.failed,
    }))
}
