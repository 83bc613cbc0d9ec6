pub mod decision;
pub mod event;
pub mod holding;
pub mod indicator;
pub mod instrument;
pub mod ohlcv;
pub mod signal;
pub mod snapshot;

pub use decision::{Action, Decision};
pub use event::MarketEvent;
pub use holding::{Currency, Holding};
pub use indicator::IndicatorBundle;
pub use instrument::{AssetType, Instrument, Market};
pub use ohlcv::{BarValidationError, OhlcvBar};
pub use signal::{
    FactorScores, ReachSignal, RiskAdjustedSignal, SignalBundle, TrendSignal, TrendSignalBundle,
    TrendState,
};
pub use snapshot::PortfolioSnapshot;