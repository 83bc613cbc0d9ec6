use crate::models::ohlcv::OhlcvBar;

/// Fraction of the last `min(120, available)` overlapping N-day windows in
/// which the series actually *reached* (intraday high, not close)
/// `target_pct`% or more above the window's starting close.
pub fn base_rate_up(bars: &[OhlcvBar], target_pct: f64, horizon: u32) -> f64 {
    base_rate(bars, horizon, |entry, window| {
        if entry <= 0.0 {
            return false;
        }
        window.iter().any(|b| (b.high - entry) / entry * 100.0 >= target_pct)
    })
}

/// Symmetric construction for the downside: the window's intraday *low*
/// `target_pct`% or more below the window's starting close.
pub fn base_rate_down(bars: &[OhlcvBar], target_pct: f64, horizon: u32) -> f64 {
    base_rate(bars, horizon, |entry, window| {
        if entry <= 0.0 {
            return false;
        }
        window.iter().any(|b| (b.low - entry) / entry * 100.0 <= -target_pct)
    })
}

fn base_rate(bars: &[OhlcvBar], horizon: u32, hit: impl Fn(f64, &[OhlcvBar]) -> bool) -> f64 {
    let horizon = horizon as usize;
    if bars.len() <= horizon {
        return 0.5;
    }
    let max_start = bars.len() - horizon - 1;
    let total_windows = max_start + 1;
    let considered = total_windows.min(120);
    let first_start = total_windows - considered;

    let hits = (first_start..total_windows)
        .filter(|&start| hit(bars[start].close, &bars[start + 1..=start + horizon]))
        .count();

    hits as f64 / considered as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: i64, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(day),
            open: close,
            high: close * 1.002,
            low: close * 0.998,
            close,
            volume: 1000.0,
            adjusted_close: close,
        }
    }

    #[test]
    fn detects_an_upside_reach_within_horizon() {
        let bars: Vec<OhlcvBar> = (0..80).map(|i| bar(i, 100.0 + i as f64)).collect();
        let rate = base_rate_up(&bars, 5.0, 10);
        assert!(rate > 0.9, "monotonic uptrend should reach +5% almost always: {rate}");
    }

    #[test]
    fn detects_a_downside_reach_within_horizon() {
        let bars: Vec<OhlcvBar> = (0..80).map(|i| bar(i, 200.0 - i as f64)).collect();
        let rate = base_rate_down(&bars, 5.0, 10);
        assert!(rate > 0.9, "monotonic downtrend should breach -5% almost always: {rate}");
    }

    #[test]
    fn returns_neutral_rate_when_too_short_for_horizon() {
        let bars: Vec<OhlcvBar> = (0..3).map(|i| bar(i, 100.0 + i as f64)).collect();
        assert_eq!(base_rate_up(&bars, 5.0, 60), 0.5);
    }

    #[test]
    fn uses_intraday_high_not_close_to_detect_a_reach() {
        // Closes never move, but every bar's high pokes 6% above the
        // window's starting close — a close-only base rate would read
        // this series as a 0% hit rate.
        let bars: Vec<OhlcvBar> = (0..80)
            .map(|i| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(i),
                open: 100.0,
                high: 106.0,
                low: 99.0,
                close: 100.0,
                volume: 1000.0,
                adjusted_close: 100.0,
            })
            .collect();
        let rate = base_rate_up(&bars, 5.0, 10);
        assert!(rate > 0.9, "intraday high should register the reach: {rate}");
    }
}
