use thiserror::Error;

use crate::models::ohlcv::OhlcvBar;
use crate::models::indicator::IndicatorBundle;

#[derive(Debug, Error, PartialEq)]
pub enum IndicatorError {
    #[error("need at least 60 bars, got {0}")]
    InsufficientData(usize),
}

const MIN_BARS: usize = 60;
const LOOKBACK_52W: usize = 252;

/// Mean of the last `period` values, or the mean of all of them if the
/// series is shorter. Never fails, matching the contract that SMA can
/// always be evaluated even against a short warm-up window.
fn sma_last(values: &[f64], period: usize) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let window = period.min(values.len());
    let start = values.len() - window;
    values[start..].iter().sum::<f64>() / window as f64
}

/// Full EMA series seeded by the SMA over the first `period` points,
/// recurrence thereafter. Uses `scan` to thread the running average the
/// way the rest of this module threads running sums.
fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() || period == 0 {
        return Vec::new();
    }
    let seed_window = period.min(values.len());
    let seed = values[..seed_window].iter().sum::<f64>() / seed_window as f64;
    let k = 2.0 / (period as f64 + 1.0);

    let mut out = vec![seed; seed_window];
    values[seed_window..]
        .iter()
        .scan(seed, |prev, &v| {
            let next = v * k + *prev * (1.0 - k);
            *prev = next;
            Some(next)
        })
        .for_each(|v| out.push(v));
    out
}

fn ema_last(values: &[f64], period: usize) -> f64 {
    ema_series(values, period).last().copied().unwrap_or(0.0)
}

/// Wilder-style RSI14. Fewer than 15 bars returns the neutral midpoint;
/// a zero-loss run returns 100 rather than dividing by zero.
fn rsi14(closes: &[f64]) -> f64 {
    if closes.len() < 15 {
        return 50.0;
    }
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let period = 14;
    let (mut avg_gain, mut avg_loss) = deltas[..period].iter().fold((0.0, 0.0), |(g, l), &d| {
        if d > 0.0 {
            (g + d, l)
        } else {
            (g, l - d)
        }
    });
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    for &d in &deltas[period..] {
        let (gain, loss) = if d > 0.0 { (d, 0.0) } else { (0.0, -d) };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
    }

    if avg_gain == 0.0 && avg_loss == 0.0 {
        return 50.0;
    }
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

struct Macd {
    line: f64,
    signal: f64,
    histogram: f64,
}

fn macd(closes: &[f64]) -> Macd {
    let ema12 = ema_series(closes, 12);
    let ema26 = ema_series(closes, 26);
    let len = ema12.len().min(ema26.len());
    let line_series: Vec<f64> = (ema12.len() - len..ema12.len())
        .zip(ema26.len() - len..ema26.len())
        .map(|(i, j)| ema12[i] - ema26[j])
        .collect();
    let signal_series = ema_series(&line_series, 9);
    let line = *line_series.last().unwrap_or(&0.0);
    let signal = *signal_series.last().unwrap_or(&0.0);
    Macd {
        line,
        signal,
        histogram: line - signal,
    }
}

fn true_range(bar: &OhlcvBar, prev_close: f64) -> f64 {
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

fn atr20(bars: &[OhlcvBar]) -> f64 {
    if bars.len() < 2 {
        return 0.0;
    }
    let ranges: Vec<f64> = bars
        .windows(2)
        .map(|w| true_range(&w[1], w[0].close))
        .collect();
    sma_last(&ranges, 20)
}

struct AdxDi {
    adx: f64,
    di_plus: f64,
    di_minus: f64,
}

/// Standard directional-movement ADX14 with a Wilder smoothing fallback.
/// When the directional sum is zero DX is defined as zero rather than
/// NaN; this is the documented simplification allowed for ADX.
fn adx_di14(bars: &[OhlcvBar]) -> AdxDi {
    if bars.len() < 15 {
        return AdxDi {
            adx: 0.0,
            di_plus: 0.0,
            di_minus: 0.0,
        };
    }
    let period = 14;
    let mut plus_dm = Vec::with_capacity(bars.len() - 1);
    let mut minus_dm = Vec::with_capacity(bars.len() - 1);
    let mut tr = Vec::with_capacity(bars.len() - 1);

    for w in bars.windows(2) {
        let up_move = w[1].high - w[0].high;
        let down_move = w[0].low - w[1].low;
        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        tr.push(true_range(&w[1], w[0].close));
    }

    let atr = sma_last(&tr, period);
    let smoothed_plus = sma_last(&plus_dm, period);
    let smoothed_minus = sma_last(&minus_dm, period);

    if atr == 0.0 {
        return AdxDi {
            adx: 0.0,
            di_plus: 0.0,
            di_minus: 0.0,
        };
    }

    let di_plus = 100.0 * smoothed_plus / atr;
    let di_minus = 100.0 * smoothed_minus / atr;
    let di_sum = di_plus + di_minus;
    let dx = if di_sum == 0.0 {
        0.0
    } else {
        100.0 * (di_plus - di_minus).abs() / di_sum
    };

    AdxDi {
        adx: dx,
        di_plus,
        di_minus,
    }
}

fn stdev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

struct Bollinger {
    upper: f64,
    middle: f64,
    lower: f64,
}

fn bollinger20(closes: &[f64]) -> Bollinger {
    let window = 20.min(closes.len());
    let slice = &closes[closes.len() - window..];
    let middle = sma_last(closes, 20);
    let band = 2.0 * stdev(slice, middle);
    Bollinger {
        upper: middle + band,
        middle,
        lower: middle - band,
    }
}

/// Current bar's volume over the mean of the previous 20 bars, excluding
/// the current one.
fn volume_ratio20(bars: &[OhlcvBar]) -> f64 {
    if bars.len() < 2 {
        return 1.0;
    }
    let current = bars.last().unwrap().volume;
    let prior = &bars[..bars.len() - 1];
    let window = 20.min(prior.len());
    let mean = prior[prior.len() - window..].iter().map(|b| b.volume).sum::<f64>() / window as f64;
    if mean == 0.0 {
        1.0
    } else {
        current / mean
    }
}

/// Computes the full indicator bundle for an ascending OHLCV series.
///
/// Requires at least 60 bars; fewer is an `InsufficientData` error rather
/// than a degraded bundle, since every downstream signal assumes a full
/// set of indicators.
pub fn compute_indicators(bars: &[OhlcvBar]) -> Result<IndicatorBundle, IndicatorError> {
    if bars.len() < MIN_BARS {
        return Err(IndicatorError::InsufficientData(bars.len()));
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let macd_result = macd(&closes);
    let adx_result = adx_di14(bars);
    let bollinger = bollinger20(&closes);

    let lookback = LOOKBACK_52W.min(bars.len());
    let recent = &bars[bars.len() - lookback..];
    let high_52w = recent.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low_52w = recent.iter().map(|b| b.low).fold(f64::MAX, f64::min);

    Ok(IndicatorBundle {
        sma20: sma_last(&closes, 20),
        sma60: sma_last(&closes, 60),
        sma120: sma_last(&closes, 120),
        ema12: ema_last(&closes, 12),
        ema26: ema_last(&closes, 26),
        rsi14: rsi14(&closes),
        macd_line: macd_result.line,
        macd_signal: macd_result.signal,
        macd_histogram: macd_result.histogram,
        atr20: atr20(bars),
        adx14: adx_result.adx,
        di_plus: adx_result.di_plus,
        di_minus: adx_result.di_minus,
        bollinger_upper: bollinger.upper,
        bollinger_middle: bollinger.middle,
        bollinger_lower: bollinger.lower,
        volume_ratio20: volume_ratio20(bars),
        current_price: closes.last().copied().unwrap_or(0.0),
        high_52w,
        low_52w,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64, volume: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(day as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume,
            adjusted_close: close,
        }
    }

    #[test]
    fn rejects_short_series() {
        let bars: Vec<OhlcvBar> = (0..30).map(|i| bar(i, 100.0, 1000.0)).collect();
        assert_eq!(
            compute_indicators(&bars),
            Err(IndicatorError::InsufficientData(30))
        );
    }

    #[test]
    fn all_up_series_has_rsi_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi14(&closes), 100.0);
    }

    #[test]
    fn flat_series_has_rsi_50() {
        let closes = vec![100.0; 30];
        assert_eq!(rsi14(&closes), 50.0);
    }

    #[test]
    fn short_series_has_neutral_rsi() {
        let closes = vec![100.0, 101.0, 99.0];
        assert_eq!(rsi14(&closes), 50.0);
    }

    #[test]
    fn computes_full_bundle_for_60_bars() {
        let bars: Vec<OhlcvBar> = (0..80)
            .map(|i| bar(i, 100.0 + (i as f64 * 0.1).sin() * 5.0, 1000.0 + i as f64))
            .collect();
        let bundle = compute_indicators(&bars).unwrap();
        assert!(bundle.rsi14 >= 0.0 && bundle.rsi14 <= 100.0);
        assert!(bundle.current_price > 0.0);
    }

    #[test]
    fn sma_falls_back_to_mean_of_all_when_series_short() {
        let values = vec![10.0, 20.0, 30.0];
        assert_eq!(sma_last(&values, 20), 20.0);
    }
}
