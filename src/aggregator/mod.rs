mod reasons;

use chrono::Utc;

use crate::config::ThresholdsConfig;
use crate::models::decision::{Action, Decision};
use crate::models::event::MarketEvent;
use crate::models::indicator::IndicatorBundle;
use crate::models::signal::{SignalBundle, TrendSignal, TrendState};

/// Inputs the aggregator needs beyond the signal bundle itself: the
/// instrument identity (for reason text), events in the next 14 days,
/// and whether the instrument is currently held.
pub struct AggregatorInput<'a> {
    pub instrument_id: &'a str,
    pub display_name: &'a str,
    pub indicators: &'a IndicatorBundle,
    pub signals: &'a SignalBundle,
    pub upcoming_events: &'a [MarketEvent],
    pub is_holding: bool,
}

fn buy_score(signals: &SignalBundle, thresholds: &ThresholdsConfig) -> u8 {
    let l1_reaches = signals.l1.probability >= thresholds.l1_min_probability;
    let l3_advantage = signals.l3.is_advantage || signals.l3.sharpe_ratio >= thresholds.l3_min_sharpe;
    let l4_bullish = signals.l4.state == TrendState::Uptrend || signals.l4.signal == TrendSignal::ReversalUp;
    [l1_reaches, l3_advantage, l4_bullish].iter().filter(|&&b| b).count() as u8
}

fn sell_score(signals: &SignalBundle, thresholds: &ThresholdsConfig) -> u8 {
    let l2_reaches = signals.l2.probability >= thresholds.l2_min_probability;
    let l3_penalty = signals.l3.sharpe_ratio < -0.3;
    let l4_bearish = signals.l4.state == TrendState::Downtrend || signals.l4.signal == TrendSignal::ReversalDown;
    [l2_reaches, l3_penalty, l4_bearish].iter().filter(|&&b| b).count() as u8
}

pub fn aggregate(input: &AggregatorInput, thresholds: &ThresholdsConfig) -> Decision {
    let signals = input.signals;
    let buy = buy_score(signals, thresholds);
    let sell = sell_score(signals, thresholds);

    let (action, confidence) = if buy >= 2 && sell < 2 {
        (Action::Buy, (signals.l1.probability + signals.l4.confidence) / 2.0)
    } else if sell >= 2 && buy < 2 {
        (Action::Sell, (signals.l2.probability + signals.l4.confidence) / 2.0)
    } else if buy >= 2 && sell >= 2 {
        (Action::Watch, 0.5)
    } else if (buy >= 1) != (sell >= 1) {
        (Action::Watch, 0.5)
    } else {
        (Action::Hold, 0.5)
    };

    let mut decision = Decision {
        instrument_id: input.instrument_id.to_string(),
        action,
        confidence,
        horizon_label: signals.horizon_label(),
        reasons: Vec::new(),
        warnings: Vec::new(),
        signals: *signals,
        generated_at: Utc::now(),
    };

    if buy >= 2 && sell >= 2 {
        decision.push_warning("conflict");
    }

    if input.is_holding
        && decision.action == Action::Sell
        && !(signals.l2.probability >= 0.7 && signals.l3.sharpe_ratio <= -0.5)
    {
        decision.action = Action::Watch;
        decision.push_reason("holding; cautious");
    }

    reasons::append_reasons(&mut decision, input.indicators, signals);
    reasons::append_warnings(&mut decision, input.upcoming_events, signals);

    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::signal::{FactorScores, ReachSignal, RiskAdjustedSignal, TrendSignalBundle};

    fn indicators() -> IndicatorBundle {
        IndicatorBundle {
            sma20: 105.0,
            sma60: 100.0,
            sma120: 95.0,
            ema12: 105.0,
            ema26: 100.0,
            rsi14: 40.0,
            macd_line: 1.0,
            macd_signal: 0.5,
            macd_histogram: 0.5,
            atr20: 2.0,
            adx14: 30.0,
            di_plus: 30.0,
            di_minus: 10.0,
            bollinger_upper: 115.0,
            bollinger_middle: 105.0,
            bollinger_lower: 95.0,
            volume_ratio20: 1.8,
            current_price: 110.0,
            high_52w: 112.0,
            low_52w: 90.0,
        }
    }

    fn bullish_signals() -> SignalBundle {
        SignalBundle {
            l1: ReachSignal { probability: 0.7, target_pct: 10.0, horizon_days: 60, factor_scores: FactorScores::default() },
            l2: ReachSignal { probability: 0.2, target_pct: 10.0, horizon_days: 60, factor_scores: FactorScores::default() },
            l3: RiskAdjustedSignal { expected_return: 5.0, sharpe_ratio: 0.8, is_advantage: true },
            l4: TrendSignalBundle { state: TrendState::Uptrend, signal: TrendSignal::Continue, adx: 30.0, confidence: 0.7 },
        }
    }

    #[test]
    fn strong_bullish_signals_produce_buy() {
        let thresholds = ThresholdsConfig::default();
        let signals = bullish_signals();
        let ind = indicators();
        let input = AggregatorInput {
            instrument_id: "7203",
            display_name: "Toyota",
            indicators: &ind,
            signals: &signals,
            upcoming_events: &[],
            is_holding: false,
        };
        let decision = aggregate(&input, &thresholds);
        assert_eq!(decision.action, Action::Buy);
        assert!(decision.reasons.len() <= 5);
    }

    #[test]
    fn holding_override_downgrades_weak_sell_to_watch() {
        let thresholds = ThresholdsConfig::default();
        let mut signals = bullish_signals();
        signals.l1.probability = 0.2;
        signals.l2.probability = 0.65;
        signals.l3.sharpe_ratio = -0.4;
        signals.l3.is_advantage = false;
        signals.l4.state = TrendState::Downtrend;
        signals.l4.signal = TrendSignal::ReversalDown;
        let ind = indicators();
        let input = AggregatorInput {
            instrument_id: "7203",
            display_name: "Toyota",
            indicators: &ind,
            signals: &signals,
            upcoming_events: &[],
            is_holding: true,
        };
        let decision = aggregate(&input, &thresholds);
        assert_eq!(decision.action, Action::Watch);
        assert!(decision.reasons.iter().any(|r| r == "holding; cautious"));
    }

    /// Scenario: oversold reversal. RSI14=25, SMA20>SMA60, MACD histogram
    /// just turned positive, volume ratio 1.8, 52-week-low distance 4%.
    /// With default thresholds and L3.sharpe >= 0.5 the call is BUY.
    #[test]
    fn oversold_reversal_with_strong_risk_adjusted_edge_yields_buy() {
        let thresholds = ThresholdsConfig::default();
        let ind = IndicatorBundle {
            sma20: 102.0,
            sma60: 98.0,
            sma120: 100.0,
            ema12: 101.0,
            ema26: 99.0,
            rsi14: 25.0,
            macd_line: 0.2,
            macd_signal: 0.1,
            macd_histogram: 0.1,
            atr20: 2.0,
            adx14: 18.0,
            di_plus: 12.0,
            di_minus: 10.0,
            bollinger_upper: 108.0,
            bollinger_middle: 100.0,
            bollinger_lower: 92.0,
            volume_ratio20: 1.8,
            current_price: 96.0,
            high_52w: 115.0,
            low_52w: 92.3,
        };
        let signals = SignalBundle {
            l1: ReachSignal { probability: 0.65, target_pct: 10.0, horizon_days: 60, factor_scores: FactorScores::default() },
            l2: ReachSignal { probability: 0.55, target_pct: 10.0, horizon_days: 60, factor_scores: FactorScores::default() },
            l3: RiskAdjustedSignal { expected_return: 4.0, sharpe_ratio: 0.6, is_advantage: true },
            l4: TrendSignalBundle { state: TrendState::Range, signal: TrendSignal::ReversalUp, adx: 18.0, confidence: 0.55 },
        };
        let input = AggregatorInput {
            instrument_id: "7203",
            display_name: "Toyota",
            indicators: &ind,
            signals: &signals,
            upcoming_events: &[],
            is_holding: false,
        };
        let decision = aggregate(&input, &thresholds);
        assert_eq!(decision.action, Action::Buy);
    }

    /// Scenario: overbought continuation while holding. RSI14=78, ADX=28,
    /// SMA20>SMA60, L2.prob=0.72, L3.sharpe=-0.6. Both holding-override
    /// guards (L2 >= 0.7 and L3.sharpe <= -0.5) are met, so the override
    /// does not fire and the call stays SELL.
    #[test]
    fn overbought_continuation_while_holding_still_sells_when_override_guards_are_met() {
        let thresholds = ThresholdsConfig::default();
        let ind = IndicatorBundle {
            sma20: 130.0,
            sma60: 120.0,
            sma120: 110.0,
            ema12: 131.0,
            ema26: 125.0,
            rsi14: 78.0,
            macd_line: 1.5,
            macd_signal: 1.8,
            macd_histogram: -0.3,
            atr20: 2.5,
            adx14: 28.0,
            di_plus: 10.0,
            di_minus: 25.0,
            bollinger_upper: 135.0,
            bollinger_middle: 125.0,
            bollinger_lower: 115.0,
            volume_ratio20: 1.1,
            current_price: 132.0,
            high_52w: 134.0,
            low_52w: 95.0,
        };
        let signals = SignalBundle {
            l1: ReachSignal { probability: 0.2, target_pct: 10.0, horizon_days: 60, factor_scores: FactorScores::default() },
            l2: ReachSignal { probability: 0.72, target_pct: 10.0, horizon_days: 60, factor_scores: FactorScores::default() },
            l3: RiskAdjustedSignal { expected_return: -3.0, sharpe_ratio: -0.6, is_advantage: false },
            l4: TrendSignalBundle { state: TrendState::Downtrend, signal: TrendSignal::ReversalDown, adx: 28.0, confidence: 0.7 },
        };
        let input = AggregatorInput {
            instrument_id: "6758",
            display_name: "Sony",
            indicators: &ind,
            signals: &signals,
            upcoming_events: &[],
            is_holding: true,
        };
        let decision = aggregate(&input, &thresholds);
        assert_eq!(decision.action, Action::Sell);
    }

    /// Scenario: range-bound. ADX14=14, RSI14=52, price inside the
    /// Bollinger middle band. L4 stays RANGE and the aggregator holds.
    #[test]
    fn range_bound_market_produces_hold() {
        let thresholds = ThresholdsConfig::default();
        let ind = IndicatorBundle {
            sma20: 100.0,
            sma60: 100.0,
            sma120: 100.0,
            ema12: 100.0,
            ema26: 100.0,
            rsi14: 52.0,
            macd_line: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            atr20: 1.0,
            adx14: 14.0,
            di_plus: 15.0,
            di_minus: 14.0,
            bollinger_upper: 105.0,
            bollinger_middle: 100.0,
            bollinger_lower: 95.0,
            volume_ratio20: 1.0,
            current_price: 100.5,
            high_52w: 110.0,
            low_52w: 90.0,
        };
        let signals = SignalBundle {
            l1: ReachSignal { probability: 0.45, target_pct: 8.0, horizon_days: 60, factor_scores: FactorScores::default() },
            l2: ReachSignal { probability: 0.45, target_pct: 8.0, horizon_days: 60, factor_scores: FactorScores::default() },
            l3: RiskAdjustedSignal { expected_return: 0.0, sharpe_ratio: 0.0, is_advantage: false },
            l4: TrendSignalBundle { state: TrendState::Range, signal: TrendSignal::Continue, adx: 14.0, confidence: 0.5 },
        };
        let input = AggregatorInput {
            instrument_id: "9984",
            display_name: "SoftBank",
            indicators: &ind,
            signals: &signals,
            upcoming_events: &[],
            is_holding: false,
        };
        let decision = aggregate(&input, &thresholds);
        assert_eq!(decision.action, Action::Hold);
    }

    #[test]
    fn conflicting_scores_produce_watch_with_conflict_warning() {
        let thresholds = ThresholdsConfig::default();
        let mut signals = bullish_signals();
        signals.l2.probability = 0.9;
        signals.l3.sharpe_ratio = -0.5;
        signals.l3.is_advantage = false;
        let ind = indicators();
        let input = AggregatorInput {
            instrument_id: "7203",
            display_name: "Toyota",
            indicators: &ind,
            signals: &signals,
            upcoming_events: &[],
            is_holding: false,
        };
        let decision = aggregate(&input, &thresholds);
        assert_eq!(decision.action, Action::Watch);
        assert!(decision.warnings.iter().any(|w| w == "conflict"));
    }

    /// buy == 1 and sell == 1 simultaneously (one side scoring from L1
    /// alone, the other from L2 alone, with L3/L4 agreeing on neither)
    /// is not "exactly one side scoring >= 1"; it falls through to HOLD.
    #[test]
    fn buy_and_sell_each_scoring_exactly_one_falls_through_to_hold() {
        let thresholds = ThresholdsConfig::default();
        let ind = indicators();
        let signals = SignalBundle {
            l1: ReachSignal { probability: 0.65, target_pct: 10.0, horizon_days: 60, factor_scores: FactorScores::default() },
            l2: ReachSignal { probability: 0.65, target_pct: 10.0, horizon_days: 60, factor_scores: FactorScores::default() },
            l3: RiskAdjustedSignal { expected_return: 0.0, sharpe_ratio: 0.0, is_advantage: false },
            l4: TrendSignalBundle { state: TrendState::Range, signal: TrendSignal::Continue, adx: 15.0, confidence: 0.5 },
        };
        let input = AggregatorInput {
            instrument_id: "7203",
            display_name: "Toyota",
            indicators: &ind,
            signals: &signals,
            upcoming_events: &[],
            is_holding: false,
        };
        let decision = aggregate(&input, &thresholds);
        assert_eq!(decision.action, Action::Hold);
    }
}

/// Drives real `OhlcvBar` series through the actual kernel/signal wiring
/// (`indicators::compute_indicators` -> `signals::compute_signal_bundle`
/// -> `aggregate`) instead of hand-constructed `IndicatorBundle`/
/// `SignalBundle` values, covering the three end-to-end scenarios from
/// spec.md section 8.
#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use crate::indicators;
    use crate::models::ohlcv::OhlcvBar;
    use crate::signals;
    use chrono::NaiveDate;

    fn bars(n: i64, start_close: f64, step: f64, spike_last_volume: bool) -> Vec<OhlcvBar> {
        (0..n)
            .map(|i| {
                let close = start_close + i as f64 * step;
                let volume = if spike_last_volume && i == n - 1 { 5000.0 } else { 1000.0 };
                OhlcvBar {
                    date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(i),
                    open: close,
                    high: close * 1.01,
                    low: close * 0.99,
                    close,
                    volume,
                    adjusted_close: close,
                }
            })
            .collect()
    }

    fn run(bars: &[OhlcvBar], is_holding: bool) -> Decision {
        let indicators = indicators::compute_indicators(bars).expect("60+ bars");
        let signals = signals::compute_signal_bundle(bars, &indicators);
        let thresholds = ThresholdsConfig::default();
        let input = AggregatorInput {
            instrument_id: "7203",
            display_name: "Toyota",
            indicators: &indicators,
            signals: &signals,
            upcoming_events: &[],
            is_holding,
        };
        aggregate(&input, &thresholds)
    }

    /// 80 days of a steady, volume-confirmed uptrend: RSI pins at 100 (no
    /// down day ever occurs), ADX14 pins at 100 with DI+ >> DI- (every
    /// directional move is up), and the historical base rate for the
    /// 60-day horizon is 1.0 since the drift dwarfs any plausible target.
    /// L1 clears threshold, L3's edge is a large positive Sharpe ratio
    /// given the low day-to-day variance, and L4 reports Uptrend/Continue
    /// with a strong-ADX bonus: all three buy conditions hold and none of
    /// the sell conditions do.
    #[test]
    fn sustained_uptrend_drives_a_buy_through_the_real_pipeline() {
        let series = bars(80, 100.0, 0.5, true);
        let decision = run(&series, false);
        assert_eq!(decision.action, Action::Buy);
    }

    /// Mirror of the uptrend case: 80 days of a steady decline with a
    /// volume-confirmed last bar. RSI pins at 0, ADX14 pins at 100 with
    /// DI- >> DI+, the 60-day downside base rate is 1.0, and L3's edge is
    /// a large negative Sharpe ratio. All three sell conditions hold and
    /// none of the buy conditions do.
    #[test]
    fn sustained_downtrend_drives_a_sell_through_the_real_pipeline() {
        let series = bars(80, 200.0, -0.5, true);
        let decision = run(&series, false);
        assert_eq!(decision.action, Action::Sell);
    }

    /// 70 days of a perfectly flat tape: RSI sits at the documented
    /// flat-series midpoint of 50, ADX14 is 0 (no directional movement at
    /// all), and neither side's historical base rate ever registers a hit
    /// since the price never moves. Every buy and every sell condition
    /// fails, so the aggregator falls through to HOLD.
    #[test]
    fn flat_tape_drives_a_hold_through_the_real_pipeline() {
        let series = bars(70, 100.0, 0.0, false);
        let decision = run(&series, false);
        assert_eq!(decision.action, Action::Hold);
    }
}
