use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One daily OHLCV bar. Primary key is `(instrument_id, date)`.
///
/// Invariants (see `validate`): `high >= max(open, close, low)`,
/// `low <= min(open, close, high)`, `volume >= 0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub adjusted_close: f64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BarValidationError {
    #[error("high {high} below max(open={open}, close={close}, low={low})")]
    HighTooLow {
        high: f64,
        open: f64,
        close: f64,
        low: f64,
    },
    #[error("low {low} above min(open={open}, close={close}, high={high})")]
    LowTooHigh {
        low: f64,
        open: f64,
        close: f64,
        high: f64,
    },
    #[error("negative volume {0}")]
    NegativeVolume(f64),
}

impl OhlcvBar {
    pub fn validate(&self) -> Result<(), BarValidationError> {
        let max_ohc = self.open.max(self.close).max(self.low);
        if self.high < max_ohc {
            return Err(BarValidationError::HighTooLow {
                high: self.high,
                open: self.open,
                close: self.close,
                low: self.low,
            });
        }
        let min_ohc = self.open.min(self.close).min(self.high);
        if self.low > min_ohc {
            return Err(BarValidationError::LowTooHigh {
                low: self.low,
                open: self.open,
                close: self.close,
                high: self.high,
            });
        }
        if self.volume < 0.0 {
            return Err(BarValidationError::NegativeVolume(self.volume));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, high: f64, low: f64, close: f64, volume: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            open,
            high,
            low,
            close,
            volume,
            adjusted_close: close,
        }
    }

    #[test]
    fn accepts_a_well_formed_bar() {
        assert!(bar(100.0, 105.0, 99.0, 103.0, 1000.0).validate().is_ok());
    }

    #[test]
    fn rejects_high_below_close() {
        assert!(bar(100.0, 101.0, 99.0, 103.0, 1000.0).validate().is_err());
    }

    #[test]
    fn rejects_negative_volume() {
        assert!(bar(100.0, 105.0, 99.0, 103.0, -1.0).validate().is_err());
    }
}
