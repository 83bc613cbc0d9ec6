use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::ThresholdsConfig;
use crate::models::decision::Decision;

use super::{KvStore, DAILY_COUNT_TTL_SECS, EMERGENCY_STOP_KEY, PREVIOUS_DECISION_TTL_SECS, THRESHOLDS_KEY};

/// The externally-backed `KvStore` the ephemeral gating/configuration
/// state is meant to live in (spec.md section 9: "model as two kv keys
/// with explicit TTL, not as in-memory globals, so restarts preserve the
/// invariants"). Thin, cheap-to-clone handle around a `ConnectionManager`,
/// the same shape as the teacher pack's own Redis wrapper.
#[derive(Clone)]
pub struct RedisKvStore {
    manager: Arc<ConnectionManager>,
}

impl RedisKvStore {
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self {
            manager: Arc::new(manager),
        })
    }

    fn manager(&self) -> ConnectionManager {
        (*self.manager).clone()
    }

    async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T, ttl_secs: u64) -> Result<(), RedisError> {
        let mut con = self.manager();
        let payload = serde_json::to_string(value)
            .map_err(|e| RedisError::from((redis::ErrorKind::TypeError, "serde", e.to_string())))?;
        if ttl_secs == 0 {
            con.set::<_, _, ()>(key, payload).await
        } else {
            con.set_ex::<_, _, ()>(key, payload, ttl_secs).await
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RedisError> {
        let mut con = self.manager();
        let raw: Option<String> = con.get(key).await?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s).map_err(|e| {
                RedisError::from((redis::ErrorKind::TypeError, "serde", e.to_string()))
            })?)),
            None => Ok(None),
        }
    }

    fn cooldown_key(instrument_id: &str) -> String {
        format!("gate:cooldown:{instrument_id}")
    }

    fn previous_decision_key(instrument_id: &str) -> String {
        format!("gate:prev_decision:{instrument_id}")
    }

    fn daily_count_key(date: NaiveDate) -> String {
        format!("gate:daily_count:{date}")
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get_previous_decision(&self, instrument_id: &str) -> Option<Decision> {
        self.get_json(&Self::previous_decision_key(instrument_id))
            .await
            .unwrap_or(None)
    }

    async fn set_previous_decision(&self, instrument_id: &str, decision: &Decision) {
        let _ = self
            .set_json(&Self::previous_decision_key(instrument_id), decision, PREVIOUS_DECISION_TTL_SECS)
            .await;
    }

    async fn is_in_cooldown(&self, instrument_id: &str) -> bool {
        let mut con = self.manager();
        con.exists(Self::cooldown_key(instrument_id)).await.unwrap_or(false)
    }

    async fn set_cooldown(&self, instrument_id: &str, hours: i64) {
        let mut con = self.manager();
        let ttl = (hours.max(0) as u64) * 3600;
        let _: Result<(), RedisError> = con.set_ex(Self::cooldown_key(instrument_id), "1", ttl.max(1)).await;
    }

    async fn daily_notify_count(&self, date: NaiveDate) -> u32 {
        let mut con = self.manager();
        con.get::<_, Option<u32>>(Self::daily_count_key(date))
            .await
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    async fn increment_daily_notify_count(&self, date: NaiveDate) -> u32 {
        let mut con = self.manager();
        let key = Self::daily_count_key(date);
        let next: u32 = con.incr(&key, 1_i64).await.unwrap_or(1);
        if next == 1 {
            let _: Result<(), RedisError> = con.expire(&key, DAILY_COUNT_TTL_SECS as i64).await;
        }
        next
    }

    async fn is_emergency_stop(&self) -> bool {
        let mut con = self.manager();
        con.get::<_, Option<String>>(EMERGENCY_STOP_KEY)
            .await
            .ok()
            .flatten()
            .as_deref()
            == Some("1")
    }

    async fn set_emergency_stop(&self, stop: bool) {
        let mut con = self.manager();
        if stop {
            let _: Result<(), RedisError> = con.set(EMERGENCY_STOP_KEY, "1").await;
        } else {
            let _: Result<(), RedisError> = con.del(EMERGENCY_STOP_KEY).await;
        }
    }

    async fn get_thresholds(&self) -> ThresholdsConfig {
        self.get_json(THRESHOLDS_KEY).await.unwrap_or(None).unwrap_or_default()
    }

    async fn set_thresholds(&self, thresholds: ThresholdsConfig) {
        let _ = self.set_json(THRESHOLDS_KEY, &thresholds, 0).await;
    }
}
