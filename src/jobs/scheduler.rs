use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};

use crate::jobs::orchestrator;
use crate::state::AppState;

/// What the 5-minute tick should do this time around, decided purely
/// from wall-clock time (spec.md section 4.5's job table). Exactly one
/// variant other than `Idle` ever matches a given tick, since the fixed
/// job times all fall on 5-minute boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    JpDailySummary,
    UsDailySummary,
    FundRefresh,
    WeeklySummary,
    MonitoringTick,
    Idle,
}

/// JP market hours: Mon-Fri 09:00-15:00 JST. JST has no daylight saving,
/// so UTC+9 is a fixed offset and this is simply UTC 00:00-06:00.
pub fn is_jp_market_open(now: DateTime<Utc>) -> bool {
    is_weekday(now) && (0..6).contains(&now.hour())
}

/// US market hours: Mon-Fri 09:30-16:00 EST. Per spec.md's documented
/// simplification, daylight saving is not modeled, so EST (UTC-5) is
/// treated as a fixed offset: UTC 14:30-21:00.
pub fn is_us_market_open(now: DateTime<Utc>) -> bool {
    if !is_weekday(now) {
        return false;
    }
    let minutes_since_midnight = now.hour() * 60 + now.minute();
    (14 * 60 + 30..21 * 60).contains(&minutes_since_midnight)
}

fn is_weekday(now: DateTime<Utc>) -> bool {
    !matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Pure routing decision for a given instant. The fixed jobs take
/// priority over the recurring monitoring tick so a 5-minute boundary
/// that coincides with, say, 22:00 UTC runs the US summary and not both.
pub fn route(now: DateTime<Utc>) -> RouteDecision {
    if now.hour() == 7 && now.minute() == 0 {
        return RouteDecision::JpDailySummary;
    }
    if now.hour() == 22 && now.minute() == 0 {
        return RouteDecision::UsDailySummary;
    }
    if now.hour() == 13 && now.minute() == 0 {
        return RouteDecision::FundRefresh;
    }
    if now.weekday() == Weekday::Sat && now.hour() == 10 && now.minute() == 0 {
        return RouteDecision::WeeklySummary;
    }
    if is_jp_market_open(now) || is_us_market_open(now) {
        return RouteDecision::MonitoringTick;
    }
    RouteDecision::Idle
}

fn job_name(decision: RouteDecision) -> &'static str {
    match decision {
        RouteDecision::JpDailySummary => "jp_daily_summary",
        RouteDecision::UsDailySummary => "us_daily_summary",
        RouteDecision::FundRefresh => "fund_refresh",
        RouteDecision::WeeklySummary => "weekly_summary",
        RouteDecision::MonitoringTick => "monitoring_tick",
        RouteDecision::Idle => "idle",
    }
}

async fn dispatch(state: &AppState, decision: RouteDecision) {
    if decision == RouteDecision::Idle {
        return;
    }

    let name = job_name(decision);
    let run_id = match crate::store::tabular::job_runs::start(&state.pool, name).await {
        Ok(id) => Some(id),
        Err(err) => {
            error!(job = name, error = %err, "failed to record job-run start; continuing without bookkeeping");
            None
        }
    };

    let result = match decision {
        RouteDecision::JpDailySummary => orchestrator::run_jp_daily_summary(state).await,
        RouteDecision::UsDailySummary => orchestrator::run_us_daily_summary(state).await,
        RouteDecision::FundRefresh => orchestrator::run_fund_price_refresh(state).await,
        RouteDecision::WeeklySummary => orchestrator::run_weekly_summary(state).await,
        RouteDecision::MonitoringTick => orchestrator::run_monitoring_tick(state).await,
        RouteDecision::Idle => unreachable!(),
    };

    match (&result, run_id) {
        (Ok(summary), Some(id)) => {
            if let Err(err) = crate::store::tabular::job_runs::complete_success(&state.pool, id, *summary).await {
                error!(job = name, error = %err, "failed to record job-run completion");
            }
        }
        (Err(err), Some(id)) => {
            if let Err(bookkeeping_err) = crate::store::tabular::job_runs::complete_failure(&state.pool, id, &err.to_string()).await {
                error!(job = name, error = %bookkeeping_err, "failed to record job-run failure");
            }
        }
        _ => {}
    }

    match result {
        Ok(summary) => info!(job = name, processed = summary.processed, skipped = summary.skipped, failed = summary.failed, "scheduled job completed"),
        Err(err) => error!(job = name, error = %err, "scheduled job failed; will retry on the next tick"),
    }
}

/// Registers the single 5-minute cron job that drives every wall-clock
/// job in the system, following the same `tokio-cron-scheduler` pattern
/// the teacher used for its own periodic jobs. A job-level failure is
/// logged and swallowed rather than propagated, since one bad tick must
/// never stop the scheduler (spec.md section 7's cooperative-cancellation
/// stance on job failures).
pub async fn register(scheduler: &mut JobScheduler, state: Arc<AppState>) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            let decision = route(Utc::now());
            dispatch(&state, decision).await;
        })
    })?;
    scheduler.add(job).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn routes_jp_summary_at_0700_utc() {
        assert_eq!(route(at(7, 0, 13)), RouteDecision::JpDailySummary);
    }

    #[test]
    fn routes_us_summary_at_2200_utc() {
        assert_eq!(route(at(22, 0, 13)), RouteDecision::UsDailySummary);
    }

    #[test]
    fn routes_weekly_summary_on_saturday_1000_utc() {
        // 2026-07-11 is a Saturday.
        assert_eq!(route(at(10, 0, 11)), RouteDecision::WeeklySummary);
    }

    #[test]
    fn routes_monitoring_tick_during_jp_hours_on_a_weekday() {
        assert_eq!(route(at(2, 30, 13)), RouteDecision::MonitoringTick);
    }

    #[test]
    fn idle_outside_all_windows() {
        assert_eq!(route(at(10, 5, 13)), RouteDecision::Idle);
    }

    #[test]
    fn jp_market_closed_on_weekend() {
        assert!(!is_jp_market_open(at(2, 0, 11)));
    }

    #[test]
    fn us_market_open_window_is_half_past_to_the_hour() {
        assert!(!is_us_market_open(at(14, 0, 13)));
        assert!(is_us_market_open(at(14, 30, 13)));
        assert!(is_us_market_open(at(20, 59, 13)));
        assert!(!is_us_market_open(at(21, 0, 13)));
    }
}
