//! Risk and return statistics for a backtest.

pub mod analyzer;
pub mod drawdown;
pub mod ratios;

pub use analyzer::{PerformanceAnalyzer, PerformanceConfig, PerformanceMetrics};
pub use drawdown::{max_drawdown, DrawdownInfo};
pub use ratios::{
    annual_return, annual_volatility, calmar_ratio, profit_factor, sharpe_ratio, sortino_ratio,
    win_rate,
};
