use std::collections::HashSet;

use bigdecimal::BigDecimal;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::aggregator::{self, AggregatorInput};
use crate::errors::AppError;
use crate::gate;
use crate::indicators;
use crate::models::decision::{Action, Decision};
use crate::models::instrument::{Instrument, Market};
use crate::signals;
use crate::state::AppState;
use crate::store::tabular;

const SERIES_LOOKBACK_DAYS: i64 = 200;
const EVENT_HORIZON_DAYS: i64 = 14;
const INTER_REQUEST_DELAY_MS: u64 = 1_000;
const FUND_SCRAPE_DELAY_MS: u64 = 2_000;

/// Tally of per-instrument outcomes for one job run, surfaced in logs and
/// (per SPEC_FULL.md section 11) recorded as a job-run row.
#[derive(Debug, Default, Clone, Copy)]
pub struct JobSummary {
    pub processed: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Fetches the latest 200-bar series, runs indicators -> signals ->
/// aggregator, and returns the resulting `Decision` plus whether it
/// differs from the persisted snapshot. Every failure mode from spec.md
/// section 7 (insufficient data, computation bound-breach, store error)
/// is surfaced as `Ok(None)` (skip) or an `Err` the caller isolates.
async fn compute_decision(
    state: &AppState,
    instrument: &Instrument,
    holding_ids: &HashSet<String>,
) -> Result<Option<Decision>, AppError> {
    let bars = tabular::prices::get_daily_prices(&state.pool, &instrument.id, SERIES_LOOKBACK_DAYS).await?;

    if bars.len() < 60 {
        debug!(instrument = %instrument.id, bars = bars.len(), "fewer than 60 bars, skipping");
        return Ok(None);
    }

    let bundle = match indicators::compute_indicators(&bars) {
        Ok(b) => b,
        Err(err) => {
            debug!(instrument = %instrument.id, error = %err, "indicator kernel declined series, skipping");
            return Ok(None);
        }
    };

    let signal_bundle = signals::compute_signal_bundle(&bars, &bundle);
    if !(0.0..=1.0).contains(&signal_bundle.l1.probability)
        || !(0.0..=1.0).contains(&signal_bundle.l2.probability)
        || !signal_bundle.l1.probability.is_finite()
        || !signal_bundle.l3.sharpe_ratio.is_finite()
    {
        warn!(instrument = %instrument.id, "computation bound-breach in signal bundle, skipping instrument");
        return Ok(None);
    }

    let events = tabular::events::get_upcoming(&state.pool, Some(&instrument.id), EVENT_HORIZON_DAYS).await?;
    let thresholds = state.kv.get_thresholds().await;
    let input = AggregatorInput {
        instrument_id: &instrument.id,
        display_name: &instrument.display_name,
        indicators: &bundle,
        signals: &signal_bundle,
        upcoming_events: &events,
        is_holding: holding_ids.contains(&instrument.id),
    };

    Ok(Some(aggregator::aggregate(&input, &thresholds)))
}

/// Steps 3-6 of the monitoring tick (spec.md section 4.5): persist a
/// signal-history row for any non-HOLD decision, write-elide the latest
/// decision snapshot, and submit BUY/SELL decisions to the gate. WATCH
/// and HOLD never reach the gate from the monitoring tick; only the
/// periodic tick filters this way, summary jobs don't gate at all.
async fn process_instrument(state: &AppState, instrument: &Instrument, holding_ids: &HashSet<String>) -> Result<(), AppError> {
    let Some(decision) = compute_decision(state, instrument, holding_ids).await? else {
        return Ok(());
    };

    if decision.action != Action::Hold {
        tabular::signal_history::insert(&state.pool, &decision).await?;
    }

    let previous_snapshot = tabular::decision_snapshot::get_latest(&state.pool, &instrument.id).await?;
    let changed = previous_snapshot
        .as_ref()
        .map(|p| p.action != decision.action || (p.confidence - decision.confidence).abs() > 1e-9)
        .unwrap_or(true);
    if changed {
        tabular::decision_snapshot::upsert(&state.pool, &decision).await?;
    }

    if matches!(decision.action, Action::Buy | Action::Sell) {
        let outcome = gate::submit(
            &decision,
            &state.pool,
            state.kv.as_ref(),
            state.transport.as_ref(),
            &state.config.push_token,
            &state.config.push_recipient,
            Some(state.config.max_notifications_per_day),
        )
        .await;
        info!(instrument = %instrument.id, action = %decision.action, outcome = ?outcome, "monitoring tick decision submitted to gate");
    }

    Ok(())
}

/// Every 5 minutes during market hours: fetch -> signal -> gated
/// notifications for BUY/SELL only. Per-instrument failures are caught
/// and counted rather than aborting the tick (spec.md section 5/7).
pub async fn run_monitoring_tick(state: &AppState) -> Result<JobSummary, AppError> {
    let instruments = tabular::instruments::get_all(&state.pool, true).await?;
    let holding_ids: HashSet<String> = tabular::holdings::get_holding_instrument_ids(&state.pool)
        .await?
        .into_iter()
        .collect();

    let mut summary = JobSummary::default();
    for instrument in &instruments {
        match process_instrument(state, instrument, &holding_ids).await {
            Ok(()) => summary.processed += 1,
            Err(err) => {
                warn!(instrument = %instrument.id, error = %err, "monitoring tick: instrument failed, continuing");
                summary.failed += 1;
            }
        }
    }
    summary.skipped = instruments.len() as u32 - summary.processed - summary.failed;
    Ok(summary)
}

/// Refreshes the daily OHLCV series for every active instrument in
/// `market` from the price provider, respecting the documented
/// inter-request delay between fetches (spec.md section 5).
async fn refresh_prices_for_market(state: &AppState, market: Market) -> Result<JobSummary, AppError> {
    let instruments = tabular::instruments::get_all(&state.pool, true)
        .await?
        .into_iter()
        .filter(|i| i.market == market)
        .collect::<Vec<_>>();

    let mut summary = JobSummary::default();
    for instrument in &instruments {
        match fetch_and_store_history(state, &instrument.id, 1).await {
            Ok(()) => summary.processed += 1,
            Err(err) => {
                warn!(instrument = %instrument.id, error = %err, "price refresh failed, skipping instrument this tick");
                summary.failed += 1;
            }
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(INTER_REQUEST_DELAY_MS)).await;
    }
    Ok(summary)
}

fn bigdecimal_to_f64(value: &BigDecimal) -> f64 {
    value.to_string().parse().unwrap_or(0.0)
}

/// Fetches up to `days` of daily bars for one instrument and stores them
/// as idempotent OHLCV bars, carrying the provider's real open/high/low/
/// volume through rather than collapsing every field to the close (a
/// fund NAV scrape is the one genuine exception: see
/// `FundPriceScraper::fetch_daily_history`).
async fn fetch_and_store_history(state: &AppState, instrument_id: &str, days: u32) -> Result<(), AppError> {
    let points = state.price_provider.fetch_daily_history(instrument_id, days).await?;
    for point in points {
        let bar = crate::models::ohlcv::OhlcvBar {
            date: point.date,
            open: bigdecimal_to_f64(&point.open),
            high: bigdecimal_to_f64(&point.high),
            low: bigdecimal_to_f64(&point.low),
            close: bigdecimal_to_f64(&point.close),
            volume: point.volume,
            adjusted_close: bigdecimal_to_f64(&point.close),
        };
        if bar.validate().is_ok() {
            tabular::prices::insert_daily_price(&state.pool, instrument_id, &bar).await?;
        }
    }
    Ok(())
}

/// Administrative one-shot seeding: backfills `SERIES_LOOKBACK_DAYS` of
/// daily history for every active instrument regardless of market,
/// so a fresh deployment clears the 60-bar `InsufficientData` floor
/// before its first scheduled tick (spec.md section 6, `POST
/// /admin/initialize`).
pub async fn run_seed_historical_series(state: &AppState) -> Result<JobSummary, AppError> {
    let instruments = tabular::instruments::get_all(&state.pool, true).await?;

    let mut summary = JobSummary::default();
    for instrument in &instruments {
        match fetch_and_store_history(state, &instrument.id, SERIES_LOOKBACK_DAYS as u32).await {
            Ok(()) => summary.processed += 1,
            Err(err) => {
                warn!(instrument = %instrument.id, error = %err, "historical seed failed, skipping instrument");
                summary.failed += 1;
            }
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(INTER_REQUEST_DELAY_MS)).await;
    }
    Ok(summary)
}

/// Holdings total value, plus daily/weekly/monthly P&L computed from
/// portfolio snapshots as `todayValue - baselineValue` (resolving the
/// spec.md section 9 Open Question in favor of the snapshot-diff
/// definition rather than the zero or raw-unrealized-P&L variants).
async fn build_and_persist_snapshot(state: &AppState) -> Result<(BigDecimal, BigDecimal, BigDecimal), AppError> {
    let holdings = tabular::holdings::get_all(&state.pool).await?;
    let total_value = holdings
        .iter()
        .fold(BigDecimal::from(0), |acc, h| acc + &h.market_value);

    let yesterday = Utc::now().date_naive() - chrono::Duration::days(1);
    let yesterday_value = tabular::snapshots::value_on_or_before(&state.pool, yesterday)
        .await?
        .unwrap_or_else(|| total_value.clone());
    let daily_pnl = &total_value - &yesterday_value;

    tabular::snapshots::save(&state.pool, &total_value, &daily_pnl).await?;
    let weekly_pnl = tabular::snapshots::calculate_weekly_pnl(&state.pool, &total_value).await?;
    let monthly_pnl = tabular::snapshots::calculate_monthly_pnl(&state.pool, &total_value).await?;

    Ok((daily_pnl, weekly_pnl, monthly_pnl))
}

fn format_summary_message(market_label: &str, total_value: &BigDecimal, daily_pnl: &BigDecimal, weekly_pnl: &BigDecimal, monthly_pnl: &BigDecimal) -> String {
    format!(
        "{market_label} summary\nTotal value: {total_value}\nDaily P&L: {daily_pnl}\nWeekly P&L: {weekly_pnl}\nMonthly P&L: {monthly_pnl}"
    )
}

/// 07:00 UTC — JP daily summary: fetch -> signals -> summary message -> snapshot.
pub async fn run_jp_daily_summary(state: &AppState) -> Result<JobSummary, AppError> {
    let refresh = refresh_prices_for_market(state, Market::Jp).await?;
    let (daily, weekly, monthly) = build_and_persist_snapshot(state).await?;
    let holdings_value = tabular::holdings::get_all(&state.pool)
        .await?
        .iter()
        .fold(BigDecimal::from(0), |acc, h| acc + &h.market_value);
    let message = format_summary_message("JP", &holdings_value, &daily, &weekly, &monthly);
    let _ = state
        .transport
        .send_push(&state.config.push_token, &state.config.push_recipient, &message)
        .await;
    Ok(refresh)
}

/// 22:00 UTC — US daily summary, mirroring the JP job for the US market.
pub async fn run_us_daily_summary(state: &AppState) -> Result<JobSummary, AppError> {
    let refresh = refresh_prices_for_market(state, Market::Us).await?;
    let (daily, weekly, monthly) = build_and_persist_snapshot(state).await?;
    let holdings_value = tabular::holdings::get_all(&state.pool)
        .await?
        .iter()
        .fold(BigDecimal::from(0), |acc, h| acc + &h.market_value);
    let message = format_summary_message("US", &holdings_value, &daily, &weekly, &monthly);
    let _ = state
        .transport
        .send_push(&state.config.push_token, &state.config.push_recipient, &message)
        .await;
    Ok(refresh)
}

/// 13:00 UTC — mutual-fund price refresh only, no signal generation.
/// Fund NAVs are scraped by fund code with the ~2s inter-request delay
/// spec.md section 5 calls for fund scraping specifically.
pub async fn run_fund_price_refresh(state: &AppState) -> Result<JobSummary, AppError> {
    let instruments = tabular::instruments::get_all(&state.pool, true)
        .await?
        .into_iter()
        .filter(|i| i.asset_type == crate::models::instrument::AssetType::MutualFund)
        .collect::<Vec<_>>();

    let mut summary = JobSummary::default();
    for instrument in &instruments {
        match state.price_provider.fetch_quote(&instrument.id).await {
            Ok(quote) => {
                tabular::holdings::update_price(&state.pool, &instrument.id, &quote.price).await?;
                summary.processed += 1;
            }
            Err(err) => {
                warn!(instrument = %instrument.id, error = %err, "fund price refresh failed, skipping");
                summary.failed += 1;
            }
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(FUND_SCRAPE_DELAY_MS)).await;
    }
    Ok(summary)
}

/// Saturday 10:00 UTC — weekly summary, reusing the same snapshot/P&L
/// machinery as the daily summaries but without a price refresh (markets
/// are closed on Saturday).
pub async fn run_weekly_summary(state: &AppState) -> Result<JobSummary, AppError> {
    let removed = tabular::prices::cleanup_intraday_prices(&state.pool).await?;
    if removed > 0 {
        info!(removed, "weekly summary: pruned stale intraday prices");
    }
    let (daily, weekly, monthly) = build_and_persist_snapshot(state).await?;
    let holdings_value = tabular::holdings::get_all(&state.pool)
        .await?
        .iter()
        .fold(BigDecimal::from(0), |acc, h| acc + &h.market_value);
    let message = format_summary_message("Weekly", &holdings_value, &daily, &weekly, &monthly);
    let _ = state
        .transport
        .send_push(&state.config.push_token, &state.config.push_recipient, &message)
        .await;
    info!(generated_at = %Utc::now(), "weekly summary sent");
    Ok(JobSummary { processed: 1, ..Default::default() })
}
