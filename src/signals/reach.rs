use crate::models::indicator::IndicatorBundle;
use crate::models::ohlcv::OhlcvBar;
use crate::models::signal::{FactorScores, ReachSignal};

use super::historical;

const MOMENTUM_WEIGHT: f64 = 0.25;
const TREND_WEIGHT: f64 = 0.30;
const BREAKOUT_WEIGHT: f64 = 0.20;
const VOLUME_WEIGHT: f64 = 0.25;
const FACTOR_WEIGHT: f64 = 0.6;
const HISTORICAL_WEIGHT: f64 = 0.4;

/// `X = clamp(ATR% * 2, 5, 30)`, the move size both L1 and L2 target.
pub fn target_pct(indicators: &IndicatorBundle) -> f64 {
    (indicators.atr_pct() * 2.0).clamp(5.0, 30.0)
}

fn momentum_up(rsi: f64) -> f64 {
    if rsi < 30.0 {
        0.75
    } else if rsi < 50.0 {
        0.6
    } else if rsi < 70.0 {
        0.45
    } else {
        0.3
    }
}

fn momentum_down(rsi: f64) -> f64 {
    if rsi > 70.0 {
        0.75
    } else if rsi > 50.0 {
        0.6
    } else if rsi > 30.0 {
        0.45
    } else {
        0.3
    }
}

fn trend_up(indicators: &IndicatorBundle) -> f64 {
    let above20 = indicators.current_price > indicators.sma20;
    let above60 = indicators.current_price > indicators.sma60;
    let base = if above20 && above60 {
        0.7
    } else if above60 {
        0.6
    } else if above20 {
        0.5
    } else {
        0.35
    };
    if indicators.sma20 > indicators.sma60 {
        (base + 0.1_f64).min(0.8)
    } else {
        base
    }
}

fn trend_down(indicators: &IndicatorBundle) -> f64 {
    let below20 = indicators.current_price < indicators.sma20;
    let below60 = indicators.current_price < indicators.sma60;
    let base = if below20 && below60 {
        0.7
    } else if below60 {
        0.6
    } else if below20 {
        0.5
    } else {
        0.35
    };
    if indicators.sma20 < indicators.sma60 {
        (base + 0.1_f64).min(0.8)
    } else {
        base
    }
}

fn breakout_up(indicators: &IndicatorBundle) -> f64 {
    let distance = indicators.distance_to_52w_high_pct();
    if distance < 5.0 {
        0.7
    } else if distance < 15.0 {
        0.55
    } else if distance < 30.0 {
        0.45
    } else {
        0.35
    }
}

fn breakout_down(indicators: &IndicatorBundle) -> f64 {
    let distance = indicators.distance_to_52w_low_pct();
    if distance < 5.0 {
        0.7
    } else if distance < 15.0 {
        0.55
    } else if distance < 30.0 {
        0.45
    } else {
        0.35
    }
}

fn volume_up(indicators: &IndicatorBundle) -> f64 {
    if indicators.volume_ratio20 > 1.5 {
        0.7
    } else if indicators.volume_ratio20 > 1.0 {
        0.55
    } else {
        0.4
    }
}

/// Volume confirmation requires both elevated volume and a down day;
/// an up day on heavy volume does not confirm a downside move.
fn volume_down(indicators: &IndicatorBundle, is_down_day: bool) -> f64 {
    if !is_down_day {
        return 0.4;
    }
    volume_up(indicators)
}

pub fn upside_reach(
    bars: &[OhlcvBar],
    indicators: &IndicatorBundle,
    target_pct: f64,
    horizon: u32,
) -> ReachSignal {
    let factors = FactorScores {
        momentum: momentum_up(indicators.rsi14),
        trend: trend_up(indicators),
        breakout: breakout_up(indicators),
        volume: volume_up(indicators),
    };
    let factor_score = factors.momentum * MOMENTUM_WEIGHT
        + factors.trend * TREND_WEIGHT
        + factors.breakout * BREAKOUT_WEIGHT
        + factors.volume * VOLUME_WEIGHT;
    let base_rate = historical::base_rate_up(bars, target_pct, horizon);
    let probability =
        (factor_score * FACTOR_WEIGHT + base_rate * HISTORICAL_WEIGHT).clamp(0.1, 0.9);

    ReachSignal {
        probability,
        target_pct,
        horizon_days: horizon,
        factor_scores: factors,
    }
}

pub fn downside_reach(
    bars: &[OhlcvBar],
    indicators: &IndicatorBundle,
    target_pct: f64,
    horizon: u32,
) -> ReachSignal {
    let down_day = bars.len() >= 2 && bars[bars.len() - 1].close < bars[bars.len() - 2].close;
    let factors = FactorScores {
        momentum: momentum_down(indicators.rsi14),
        trend: trend_down(indicators),
        breakout: breakout_down(indicators),
        volume: volume_down(indicators, down_day),
    };
    let factor_score = factors.momentum * MOMENTUM_WEIGHT
        + factors.trend * TREND_WEIGHT
        + factors.breakout * BREAKOUT_WEIGHT
        + factors.volume * VOLUME_WEIGHT;
    let base_rate = historical::base_rate_down(bars, target_pct, horizon);
    let probability =
        (factor_score * FACTOR_WEIGHT + base_rate * HISTORICAL_WEIGHT).clamp(0.1, 0.9);

    ReachSignal {
        probability,
        target_pct,
        horizon_days: horizon,
        factor_scores: factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn flat_bars(close: f64, n: i64) -> Vec<OhlcvBar> {
        (0..n)
            .map(|i| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(i),
                open: close,
                high: close * 1.002,
                low: close * 0.998,
                close,
                volume: 1000.0,
                adjusted_close: close,
            })
            .collect()
    }

    fn bundle(rsi: f64, price: f64, sma20: f64, sma60: f64, vol_ratio: f64) -> IndicatorBundle {
        IndicatorBundle {
            sma20,
            sma60,
            sma120: sma60,
            ema12: price,
            ema26: price,
            rsi14: rsi,
            macd_line: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            atr20: price * 0.02,
            adx14: 20.0,
            di_plus: 20.0,
            di_minus: 15.0,
            bollinger_upper: price * 1.05,
            bollinger_middle: price,
            bollinger_lower: price * 0.95,
            volume_ratio20: vol_ratio,
            current_price: price,
            high_52w: price * 1.1,
            low_52w: price * 0.9,
        }
    }

    #[test]
    fn probability_is_clamped_to_bounds() {
        let bars = flat_bars(100.0, 80);
        let ind = bundle(20.0, 110.0, 100.0, 95.0, 2.0);
        let target = target_pct(&ind);
        let signal = upside_reach(&bars, &ind, target, 60);
        assert!(signal.probability >= 0.1 && signal.probability <= 0.9);
    }

    #[test]
    fn oversold_momentum_scores_highest_bucket() {
        assert_eq!(momentum_up(20.0), 0.75);
        assert_eq!(momentum_down(80.0), 0.75);
    }

    #[test]
    fn volume_down_requires_a_down_day() {
        let ind = bundle(50.0, 100.0, 100.0, 100.0, 2.0);
        assert_eq!(volume_down(&ind, false), 0.4);
        assert_eq!(volume_down(&ind, true), 0.7);
    }
}
