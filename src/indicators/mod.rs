pub mod kernel;

pub use kernel::compute_indicators;
