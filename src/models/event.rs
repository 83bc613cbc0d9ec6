use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A scheduled market event (earnings, dividend ex-date, economic release)
/// surfaced alongside a decision so a human reading a notification has
/// context for why a signal might be noisy around that date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MarketEvent {
    pub instrument_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub importance: i16,
}

impl MarketEvent {
    /// `importance` is clamped to the documented 1-3 range; anything outside
    /// it is a data-entry bug upstream and treated as the nearest bound.
    pub fn importance_clamped(&self) -> i16 {
        self.importance.clamp(1, 3)
    }
}
