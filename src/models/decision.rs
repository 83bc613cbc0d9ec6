use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::SignalBundle;

/// The aggregator's final call for one instrument on one tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum Action {
    #[serde(rename = "BUY")]
    #[sqlx(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    #[sqlx(rename = "SELL")]
    Sell,
    #[serde(rename = "HOLD")]
    #[sqlx(rename = "HOLD")]
    Hold,
    #[serde(rename = "WATCH")]
    #[sqlx(rename = "WATCH")]
    Watch,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
            Action::Watch => write!(f, "WATCH"),
        }
    }
}

/// Output of the aggregator: an action plus the evidence behind it.
///
/// `reasons` is truncated to at most 5 entries, `warnings` to at most 3,
/// in the order the aggregator generated them (most salient first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub instrument_id: String,
    pub action: Action,
    pub confidence: f64,
    pub horizon_label: u32,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub signals: SignalBundle,
    pub generated_at: DateTime<Utc>,
}

impl Decision {
    pub fn push_reason(&mut self, reason: impl Into<String>) {
        if self.reasons.len() < 5 {
            self.reasons.push(reason.into());
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        if self.warnings.len() < 3 {
            self.warnings.push(warning.into());
        }
    }
}
