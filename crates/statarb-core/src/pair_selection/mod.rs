//! Pair selection: Engle-Granger cointegration scans with a fallback cascade.

pub mod cointegration;
pub mod half_life;
pub mod selector;

pub use cointegration::{cointegration_test, compute_spread, CointegrationTest};
pub use half_life::{half_life, spread_statistics, SpreadStatistics};
pub use selector::{
    FallbackLevel, PairCandidate, PairSelector, Ranking, SelectionLevel, SelectorConfig,
};
