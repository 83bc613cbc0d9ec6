use crate::models::signal::{ReachSignal, RiskAdjustedSignal};

fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

fn stdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `expectedReturn = P(up)*X - P(down)*Y`; `sharpe = (expectedReturn -
/// 0.005) / adjVol` where `adjVol` is the annualized daily-return stdev
/// scaled down to the horizon's fraction of a trading year.
pub fn compute(
    closes: &[f64],
    l1: &ReachSignal,
    l2: &ReachSignal,
    horizon: u32,
) -> RiskAdjustedSignal {
    let expected_return = l1.probability * l1.target_pct - l2.probability * l2.target_pct;
    let returns = daily_returns(closes);
    let annualized_std = stdev(&returns) * 252.0_f64.sqrt();
    let adj_vol = annualized_std * (horizon as f64 / 252.0).sqrt();

    let sharpe_ratio = if adj_vol == 0.0 {
        0.0
    } else {
        (expected_return - 0.005) / adj_vol
    };

    RiskAdjustedSignal {
        expected_return,
        sharpe_ratio,
        is_advantage: sharpe_ratio > 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::signal::FactorScores;

    fn reach(probability: f64, target_pct: f64) -> ReachSignal {
        ReachSignal {
            probability,
            target_pct,
            horizon_days: 60,
            factor_scores: FactorScores::default(),
        }
    }

    #[test]
    fn flat_series_yields_zero_sharpe_without_dividing_by_zero() {
        let closes = vec![100.0; 60];
        let l1 = reach(0.6, 10.0);
        let l2 = reach(0.3, 10.0);
        let result = compute(&closes, &l1, &l2, 60);
        assert_eq!(result.sharpe_ratio, 0.0);
        assert!(!result.is_advantage);
    }

    #[test]
    fn strong_upside_edge_with_low_volatility_is_an_advantage() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.01)).collect();
        let l1 = reach(0.8, 15.0);
        let l2 = reach(0.2, 15.0);
        let result = compute(&closes, &l1, &l2, 60);
        assert!(result.sharpe_ratio > 0.5);
        assert!(result.is_advantage);
    }
}
