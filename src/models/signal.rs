use serde::{Deserialize, Serialize};

/// The four weighted factor scores behind an L1/L2 reach probability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct FactorScores {
    pub momentum: f64,
    pub trend: f64,
    pub breakout: f64,
    pub volume: f64,
}

/// Upside (L1) or downside (L2) reach-probability estimate for one horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReachSignal {
    pub probability: f64,
    pub target_pct: f64,
    pub horizon_days: u32,
    pub factor_scores: FactorScores,
}

/// Risk-adjusted expectation for one horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskAdjustedSignal {
    pub expected_return: f64,
    pub sharpe_ratio: f64,
    pub is_advantage: bool,
}

/// Trend regime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum TrendState {
    #[serde(rename = "UPTREND")]
    Uptrend,
    #[serde(rename = "DOWNTREND")]
    Downtrend,
    #[serde(rename = "RANGE")]
    Range,
}

impl std::fmt::Display for TrendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendState::Uptrend => write!(f, "UPTREND"),
            TrendState::Downtrend => write!(f, "DOWNTREND"),
            TrendState::Range => write!(f, "RANGE"),
        }
    }
}

/// Trend-continuation vs. reversal call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum TrendSignal {
    #[serde(rename = "CONTINUE")]
    Continue,
    #[serde(rename = "REVERSAL_UP")]
    ReversalUp,
    #[serde(rename = "REVERSAL_DOWN")]
    ReversalDown,
}

impl std::fmt::Display for TrendSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendSignal::Continue => write!(f, "CONTINUE"),
            TrendSignal::ReversalUp => write!(f, "REVERSAL_UP"),
            TrendSignal::ReversalDown => write!(f, "REVERSAL_DOWN"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendSignalBundle {
    pub state: TrendState,
    pub signal: TrendSignal,
    pub adx: f64,
    pub confidence: f64,
}

/// The L1-L4 bundle produced for one instrument on one tick.
///
/// L1 and L2 are each the horizon (60 or 120 days) that maximizes that
/// side's own probability independently — this can mean L1 and L2 were
/// computed over different horizons. The `horizon_label` reported on a
/// `Decision` is always L1's horizon; this is the documented behavior,
/// not a defect (spec Open Question, see DESIGN.md).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalBundle {
    pub l1: ReachSignal,
    pub l2: ReachSignal,
    pub l3: RiskAdjustedSignal,
    pub l4: TrendSignalBundle,
}

impl SignalBundle {
    pub fn horizon_label(&self) -> u32 {
        self.l1.horizon_days
    }
}
