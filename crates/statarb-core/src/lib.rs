pub mod error;
pub mod stats;
pub mod types;

#[cfg(feature = "pair_selection")]
pub mod pair_selection;

#[cfg(feature = "signals")]
pub mod signals;

#[cfg(feature = "backtest")]
pub mod backtest;

#[cfg(feature = "performance")]
pub mod performance;

#[cfg(feature = "pipeline")]
pub mod pipeline;

pub use error::StatArbError;
pub use types::*;

/// Standard result type for all statarb operations
pub type StatArbResult<T> = Result<T, StatArbError>;
