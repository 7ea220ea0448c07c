//! Cost-aware return simulation for a signal table.

pub mod engine;

pub use engine::{BacktestConfig, BacktestReport, BacktestRow, Backtester};
