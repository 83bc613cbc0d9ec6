use sqlx::{FromRow, PgPool};

use crate::models::decision::{Action, Decision};
use crate::models::signal::SignalBundle;

#[derive(FromRow)]
struct DecisionSnapshotRow {
    action: Action,
    confidence: f64,
    horizon_label: i32,
    reasons: Vec<String>,
    warnings: Vec<String>,
    signals: serde_json::Value,
    generated_at: chrono::DateTime<chrono::Utc>,
}

/// Latest-decision-per-instrument table, upserted only when the new
/// `Decision` differs from what's already there (write-elision, spec.md
/// section 4.5 step 5). Distinct from `signal_history`, which is an
/// append-only log of every non-HOLD decision ever produced.
pub async fn get_latest(pool: &PgPool, instrument_id: &str) -> Result<Option<Decision>, sqlx::Error> {
    let row = sqlx::query_as::<_, DecisionSnapshotRow>(
        "SELECT action, confidence, horizon_label, reasons, warnings, signals, generated_at \
         FROM decision_snapshots WHERE instrument_id = $1",
    )
    .bind(instrument_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Decision {
        instrument_id: instrument_id.to_string(),
        action: r.action,
        confidence: r.confidence,
        horizon_label: r.horizon_label as u32,
        reasons: r.reasons,
        warnings: r.warnings,
        signals: serde_json::from_value::<SignalBundle>(r.signals).unwrap_or_else(|_| neutral_signals()),
        generated_at: r.generated_at,
    }))
}

pub async fn upsert(pool: &PgPool, decision: &Decision) -> Result<(), sqlx::Error> {
    let signals_json = serde_json::to_value(&decision.signals).unwrap_or(serde_json::Value::Null);
    sqlx::query(
        "INSERT INTO decision_snapshots \
         (instrument_id, action, confidence, horizon_label, reasons, warnings, signals, generated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (instrument_id) DO UPDATE SET \
         action = EXCLUDED.action, confidence = EXCLUDED.confidence, horizon_label = EXCLUDED.horizon_label, \
         reasons = EXCLUDED.reasons, warnings = EXCLUDED.warnings, signals = EXCLUDED.signals, \
         generated_at = EXCLUDED.generated_at",
    )
    .bind(&decision.instrument_id)
    .bind(decision.action)
    .bind(decision.confidence)
    .bind(decision.horizon_label as i32)
    .bind(&decision.reasons)
    .bind(&decision.warnings)
    .bind(signals_json)
    .bind(decision.generated_at)
    .execute(pool)
    .await?;
    Ok(())
}

fn neutral_signals() -> SignalBundle {
    use crate::models::signal::*;
    SignalBundle {
        l1: ReachSignal { probability: 0.5, target_pct: 0.0, horizon_days: 60, factor_scores: FactorScores::default() },
        l2: ReachSignal { probability: 0.5, target_pct: 0.0, horizon_days: 60, factor_scores: FactorScores::default() },
        l3: RiskAdjustedSignal { expected_return: 0.0, sharpe_ratio: 0.0, is_advantage: false },
        l4: TrendSignalBundle { state: TrendState::Range, signal: TrendSignal::Continue, adx: 0.0, confidence: 0.5 },
    }
}
