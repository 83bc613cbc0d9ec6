use crate::models::indicator::IndicatorBundle;
use crate::models::signal::{TrendSignal, TrendSignalBundle, TrendState};

const RANGE_ADX_CEILING: f64 = 20.0;
const STRONG_ADX: f64 = 25.0;
const WEAK_ADX: f64 = 15.0;

fn state(indicators: &IndicatorBundle) -> TrendState {
    if indicators.adx14 < RANGE_ADX_CEILING {
        TrendState::Range
    } else if indicators.di_plus > indicators.di_minus {
        TrendState::Uptrend
    } else {
        TrendState::Downtrend
    }
}

fn signal_and_baseline(state: TrendState, indicators: &IndicatorBundle) -> (TrendSignal, f64) {
    let rsi_oversold = indicators.rsi14 < 30.0;
    let rsi_overbought = indicators.rsi14 > 70.0;
    let macd_up = indicators.macd_is_up();
    let macd_down = !macd_up;

    match state {
        TrendState::Range => {
            if rsi_oversold && macd_up {
                (TrendSignal::ReversalUp, 0.55)
            } else if rsi_overbought && macd_down {
                (TrendSignal::ReversalDown, 0.55)
            } else {
                (TrendSignal::Continue, 0.5)
            }
        }
        TrendState::Uptrend => {
            if indicators.death_cross() || (rsi_overbought && macd_down) {
                (TrendSignal::ReversalDown, 0.6)
            } else if indicators.adx14 > STRONG_ADX && indicators.macd_histogram > 0.0 {
                (TrendSignal::Continue, 0.7)
            } else {
                (TrendSignal::Continue, 0.55)
            }
        }
        TrendState::Downtrend => {
            if indicators.golden_cross() || (rsi_oversold && macd_up) {
                (TrendSignal::ReversalUp, 0.6)
            } else if indicators.adx14 > STRONG_ADX && indicators.macd_histogram < 0.0 {
                (TrendSignal::Continue, 0.7)
            } else {
                (TrendSignal::Continue, 0.55)
            }
        }
    }
}

/// ADX14 picks the regime, the regime-x-signal table picks a baseline
/// confidence, then ADX magnitude nudges it +-0.1 before clamping to
/// [0.3, 0.85].
pub fn compute(indicators: &IndicatorBundle) -> TrendSignalBundle {
    let state = state(indicators);
    let (signal, baseline) = signal_and_baseline(state, indicators);

    let adjusted = if indicators.adx14 > STRONG_ADX {
        baseline + 0.1
    } else if indicators.adx14 < WEAK_ADX {
        baseline - 0.1
    } else {
        baseline
    };

    TrendSignalBundle {
        state,
        signal,
        adx: indicators.adx14,
        confidence: adjusted.clamp(0.3, 0.85),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(adx: f64, di_plus: f64, di_minus: f64, rsi: f64, macd_hist: f64, sma20: f64, sma60: f64) -> IndicatorBundle {
        IndicatorBundle {
            sma20,
            sma60,
            sma120: sma60,
            ema12: 100.0,
            ema26: 100.0,
            rsi14: rsi,
            macd_line: macd_hist,
            macd_signal: 0.0,
            macd_histogram: macd_hist,
            atr20: 2.0,
            adx14: adx,
            di_plus,
            di_minus,
            bollinger_upper: 105.0,
            bollinger_middle: 100.0,
            bollinger_lower: 95.0,
            volume_ratio20: 1.0,
            current_price: 100.0,
            high_52w: 110.0,
            low_52w: 90.0,
        }
    }

    #[test]
    fn low_adx_is_classified_as_range() {
        let ind = bundle(10.0, 20.0, 18.0, 50.0, 0.0, 100.0, 100.0);
        let bundle_out = compute(&ind);
        assert_eq!(bundle_out.state, TrendState::Range);
    }

    #[test]
    fn strong_uptrend_with_positive_histogram_continues() {
        let ind = bundle(30.0, 30.0, 10.0, 55.0, 0.5, 105.0, 100.0);
        let bundle_out = compute(&ind);
        assert_eq!(bundle_out.state, TrendState::Uptrend);
        assert_eq!(bundle_out.signal, TrendSignal::Continue);
        assert_eq!(bundle_out.confidence, 0.8);
    }

    #[test]
    fn death_cross_in_uptrend_flags_reversal_down() {
        let ind = bundle(22.0, 30.0, 10.0, 50.0, 0.1, 95.0, 100.0);
        let bundle_out = compute(&ind);
        assert_eq!(bundle_out.signal, TrendSignal::ReversalDown);
    }

    #[test]
    fn confidence_is_clamped_to_bounds() {
        let ind = bundle(5.0, 20.0, 19.0, 50.0, 0.0, 100.0, 100.0);
        let bundle_out = compute(&ind);
        assert!(bundle_out.confidence >= 0.3);
    }
}
