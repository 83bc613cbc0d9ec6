use serde::{Deserialize, Serialize};

/// Full set of technical indicators derived from an ascending OHLCV series.
///
/// Only produced once a series holds at least 60 bars; see
/// `crate::indicators::kernel::compute_indicators`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndicatorBundle {
    pub sma20: f64,
    pub sma60: f64,
    pub sma120: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub rsi14: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub atr20: f64,
    pub adx14: f64,
    pub di_plus: f64,
    pub di_minus: f64,
    pub bollinger_upper: f64,
    pub bollinger_middle: f64,
    pub bollinger_lower: f64,
    pub volume_ratio20: f64,
    pub current_price: f64,
    pub high_52w: f64,
    pub low_52w: f64,
}

impl IndicatorBundle {
    /// ATR expressed as a percentage of the current price.
    pub fn atr_pct(&self) -> f64 {
        if self.current_price > 0.0 {
            (self.atr20 / self.current_price) * 100.0
        } else {
            0.0
        }
    }

    pub fn distance_to_52w_high_pct(&self) -> f64 {
        if self.high_52w > 0.0 {
            ((self.high_52w - self.current_price) / self.high_52w) * 100.0
        } else {
            0.0
        }
    }

    pub fn distance_to_52w_low_pct(&self) -> f64 {
        if self.low_52w > 0.0 {
            ((self.current_price - self.low_52w) / self.low_52w) * 100.0
        } else {
            0.0
        }
    }

    pub fn macd_is_up(&self) -> bool {
        self.macd_histogram > 0.0
    }

    pub fn golden_cross(&self) -> bool {
        self.sma20 > self.sma60
    }

    pub fn death_cross(&self) -> bool {
        self.sma20 < self.sma60
    }
}
