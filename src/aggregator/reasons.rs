use chrono::{Duration, Utc};

use crate::models::decision::Decision;
use crate::models::event::MarketEvent;
use crate::models::indicator::IndicatorBundle;
use crate::models::signal::SignalBundle;

/// Human-readable evidence strings drawn from indicator extremes and the
/// trend call. Capped at 5 by `Decision::push_reason`.
pub fn append_reasons(decision: &mut Decision, indicators: &IndicatorBundle, signals: &SignalBundle) {
    if indicators.rsi14 < 30.0 {
        decision.push_reason(format!("RSI oversold at {:.0}", indicators.rsi14));
    } else if indicators.rsi14 > 70.0 {
        decision.push_reason(format!("RSI overbought at {:.0}", indicators.rsi14));
    }

    if indicators.current_price > indicators.sma20 && indicators.current_price > indicators.sma60 {
        decision.push_reason("price above both SMA20 and SMA60");
    } else if indicators.current_price < indicators.sma20 && indicators.current_price < indicators.sma60 {
        decision.push_reason("price below both SMA20 and SMA60");
    }

    if indicators.volume_ratio20 > 1.5 {
        decision.push_reason(format!("volume surge {:.1}x average", indicators.volume_ratio20));
    }

    if indicators.macd_is_up() {
        decision.push_reason("MACD histogram positive");
    } else {
        decision.push_reason("MACD histogram negative");
    }

    if indicators.adx14 > 25.0 {
        decision.push_reason(format!("{} trend with ADX {:.0}", signals.l4.state, indicators.adx14));
    }
}

/// Warnings for upcoming high-importance events and for an expected
/// downside move large enough to be worth flagging.
pub fn append_warnings(decision: &mut Decision, upcoming_events: &[MarketEvent], signals: &SignalBundle) {
    let horizon = Utc::now().date_naive() + Duration::days(14);
    for event in upcoming_events {
        if event.importance_clamped() >= 2 && event.date <= horizon {
            decision.push_warning(format!("{}: {}", event.date, event.description));
        }
    }

    let expected_drawdown = (signals.l2.target_pct * signals.l2.probability).round();
    if expected_drawdown > 5.0 {
        decision.push_warning(format!("expected max drawdown ~{:.0}%", expected_drawdown));
    }
}
