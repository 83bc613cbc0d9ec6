pub mod redis_store;
mod ttl_cache;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ThresholdsConfig;
use crate::models::decision::Decision;
use ttl_cache::TtlCache;

const PREVIOUS_DECISION_TTL_DAYS: i64 = 7;
const DAILY_COUNT_TTL_HOURS: i64 = 48;
const PREVIOUS_DECISION_TTL_SECS: u64 = PREVIOUS_DECISION_TTL_DAYS as u64 * 24 * 3600;
const DAILY_COUNT_TTL_SECS: u64 = DAILY_COUNT_TTL_HOURS as u64 * 3600;
const EMERGENCY_STOP_KEY: &str = "gate:emergency_stop";
const THRESHOLDS_KEY: &str = "config:thresholds";

/// Ephemeral gating and configuration state, owned exclusively by this
/// component; the tabular store never reaches into it and vice versa.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get_previous_decision(&self, instrument_id: &str) -> Option<Decision>;
    async fn set_previous_decision(&self, instrument_id: &str, decision: &Decision);

    async fn is_in_cooldown(&self, instrument_id: &str) -> bool;
    async fn set_cooldown(&self, instrument_id: &str, hours: i64);

    async fn daily_notify_count(&self, date: NaiveDate) -> u32;
    async fn increment_daily_notify_count(&self, date: NaiveDate) -> u32;

    async fn is_emergency_stop(&self) -> bool;
    async fn set_emergency_stop(&self, stop: bool);

    async fn get_thresholds(&self) -> ThresholdsConfig;
    async fn set_thresholds(&self, thresholds: ThresholdsConfig);
}

/// In-process fake, mirroring the shape of the ticker failure cache:
/// cheap to clone, safe to share across the scheduler and the admin
/// routes via an `Arc`. Exists for tests only — a real deployment wires
/// `redis_store::RedisKvStore` instead, since the kv store is a
/// deliberately out-of-scope external collaborator (spec.md section 1)
/// and an in-process store would silently clear the emergency-stop flag
/// and daily counter on every restart.
#[derive(Clone)]
pub struct InMemoryKvStore {
    previous_decisions: Arc<TtlCache<Decision>>,
    cooldowns: Arc<TtlCache<()>>,
    daily_counts: Arc<TtlCache<u32>>,
    emergency_stop: Arc<AtomicBool>,
    thresholds: Arc<RwLock<ThresholdsConfig>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self {
            previous_decisions: Arc::new(TtlCache::new()),
            cooldowns: Arc::new(TtlCache::new()),
            daily_counts: Arc::new(TtlCache::new()),
            emergency_stop: Arc::new(AtomicBool::new(false)),
            thresholds: Arc::new(RwLock::new(ThresholdsConfig::default())),
        }
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get_previous_decision(&self, instrument_id: &str) -> Option<Decision> {
        self.previous_decisions.get(instrument_id)
    }

    async fn set_previous_decision(&self, instrument_id: &str, decision: &Decision) {
        self.previous_decisions.set(
            instrument_id,
            decision.clone(),
            Duration::days(PREVIOUS_DECISION_TTL_DAYS),
        );
    }

    async fn is_in_cooldown(&self, instrument_id: &str) -> bool {
        self.cooldowns.get(instrument_id).is_some()
    }

    async fn set_cooldown(&self, instrument_id: &str, hours: i64) {
        self.cooldowns.set(instrument_id, (), Duration::hours(hours));
    }

    async fn daily_notify_count(&self, date: NaiveDate) -> u32 {
        self.daily_counts.get(&date.to_string()).unwrap_or(0)
    }

    async fn increment_daily_notify_count(&self, date: NaiveDate) -> u32 {
        let key = date.to_string();
        let next = self.daily_counts.get(&key).unwrap_or(0) + 1;
        self.daily_counts
            .set(&key, next, Duration::hours(DAILY_COUNT_TTL_HOURS));
        next
    }

    async fn is_emergency_stop(&self) -> bool {
        self.emergency_stop.load(Ordering::SeqCst)
    }

    async fn set_emergency_stop(&self, stop: bool) {
        self.emergency_stop.store(stop, Ordering::SeqCst);
    }

    async fn get_thresholds(&self) -> ThresholdsConfig {
        *self.thresholds.read()
    }

    async fn set_thresholds(&self, thresholds: ThresholdsConfig) {
        *self.thresholds.write() = thresholds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decision::Action;
    use crate::models::signal::{FactorScores, ReachSignal, RiskAdjustedSignal, TrendSignal, TrendSignalBundle, TrendState};
    use crate::models::signal::SignalBundle;

    fn sample_decision() -> Decision {
        Decision {
            instrument_id: "7203".to_string(),
            action: Action::Buy,
            confidence: 0.7,
            horizon_label: 60,
            reasons: vec![],
            warnings: vec![],
            signals: SignalBundle {
                l1: ReachSignal { probability: 0.7, target_pct: 10.0, horizon_days: 60, factor_scores: FactorScores::default() },
                l2: ReachSignal { probability: 0.2, target_pct: 10.0, horizon_days: 60, factor_scores: FactorScores::default() },
                l3: RiskAdjustedSignal { expected_return: 5.0, sharpe_ratio: 0.8, is_advantage: true },
                l4: TrendSignalBundle { state: TrendState::Uptrend, signal: TrendSignal::Continue, adx: 30.0, confidence: 0.7 },
            },
            generated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn emergency_stop_defaults_to_false() {
        let store = InMemoryKvStore::new();
        assert!(!store.is_emergency_stop().await);
        store.set_emergency_stop(true).await;
        assert!(store.is_emergency_stop().await);
    }

    #[tokio::test]
    async fn daily_notify_count_increments_and_is_keyed_by_date() {
        let store = InMemoryKvStore::new();
        let today = Utc::now().date_naive();
        assert_eq!(store.daily_notify_count(today).await, 0);
        assert_eq!(store.increment_daily_notify_count(today).await, 1);
        assert_eq!(store.increment_daily_notify_count(today).await, 2);
    }

    #[tokio::test]
    async fn previous_decision_round_trips() {
        let store = InMemoryKvStore::new();
        let decision = sample_decision();
        store.set_previous_decision("7203", &decision).await;
        let fetched = store.get_previous_decision("7203").await.unwrap();
        assert_eq!(fetched.action, Action::Buy);
    }

    #[tokio::test]
    async fn cooldown_is_observed_until_it_expires() {
        let store = InMemoryKvStore::new();
        assert!(!store.is_in_cooldown("7203").await);
        store.set_cooldown("7203", 24).await;
        assert!(store.is_in_cooldown("7203").await);
    }
}
