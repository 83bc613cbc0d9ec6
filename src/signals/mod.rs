pub mod historical;
pub mod reach;
pub mod risk_adjusted;
pub mod trend;

use crate::models::indicator::IndicatorBundle;
use crate::models::ohlcv::OhlcvBar;
use crate::models::signal::SignalBundle;

const HORIZONS: [u32; 2] = [60, 120];

/// Computes L1-L4 for both candidate horizons and selects, independently
/// per side, the horizon that maximizes that side's own metric. The
/// horizon label carried on the resulting bundle is always L1's, per the
/// documented aggregator behavior.
pub fn compute_signal_bundle(bars: &[OhlcvBar], indicators: &IndicatorBundle) -> SignalBundle {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let target_up_pct = reach::target_pct(indicators);
    let target_down_pct = target_up_pct;

    let l1_candidates: Vec<_> = HORIZONS
        .iter()
        .map(|&n| reach::upside_reach(bars, indicators, target_up_pct, n))
        .collect();
    let l1 = l1_candidates
        .into_iter()
        .max_by(|a, b| a.probability.total_cmp(&b.probability))
        .expect("HORIZONS is non-empty");

    let l2_candidates: Vec<_> = HORIZONS
        .iter()
        .map(|&n| reach::downside_reach(bars, indicators, target_down_pct, n))
        .collect();
    let l2 = l2_candidates
        .into_iter()
        .max_by(|a, b| a.probability.total_cmp(&b.probability))
        .expect("HORIZONS is non-empty");

    let l3_candidates: Vec<_> = HORIZONS
        .iter()
        .map(|&n| risk_adjusted::compute(&closes, &l1, &l2, n))
        .collect();
    let l3 = l3_candidates
        .into_iter()
        .max_by(|a, b| a.sharpe_ratio.total_cmp(&b.sharpe_ratio))
        .expect("HORIZONS is non-empty");

    let l4 = trend::compute(indicators);

    SignalBundle { l1, l2, l3, l4 }
}
