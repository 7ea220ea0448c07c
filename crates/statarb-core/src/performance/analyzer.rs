use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backtest::BacktestRow;
use crate::error::StatArbError;
use crate::StatArbResult;

use super::drawdown::max_drawdown;
use super::ratios::{
    annual_return, annual_volatility, calmar_ratio, profit_factor, sharpe_ratio, sortino_ratio,
    win_rate,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Annual rate, spread evenly over the periods of a year
    #[serde(default)]
    pub risk_free_rate: f64,

    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
}

fn default_periods_per_year() -> u32 {
    252
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: default_periods_per_year(),
        }
    }
}

impl PerformanceConfig {
    pub fn validate(&self) -> StatArbResult<()> {
        if self.periods_per_year == 0 {
            return Err(StatArbError::InvalidInput {
                field: "periods_per_year".into(),
                reason: "must be positive".into(),
            });
        }
        if !self.risk_free_rate.is_finite() {
            return Err(StatArbError::InvalidInput {
                field: "risk_free_rate".into(),
                reason: "must be finite".into(),
            });
        }
        Ok(())
    }
}

/// Summary statistics of one backtest. Non-finite ratios serialise as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown: f64,
    pub peak_date: NaiveDate,
    pub trough_date: NaiveDate,
    pub recovery_date: Option<NaiveDate>,
    pub peak_value: f64,
    pub trough_value: f64,
    /// Positive net returns over total_days
    pub win_rate: f64,
    pub profit_factor: f64,
    /// Backtest rows, i.e. price periods minus one; the first timestamp
    /// has no return and is not counted
    pub total_days: usize,
    /// Rows with a non-flat position
    pub trading_days: usize,
    /// trading_days / total_days
    pub days_in_market: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceAnalyzer {
    config: PerformanceConfig,
}

impl PerformanceAnalyzer {
    pub fn new(config: PerformanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    /// Derive every metric from the backtest rows.
    pub fn analyze_performance(&self, rows: &[BacktestRow]) -> StatArbResult<PerformanceMetrics> {
        self.config.validate()?;
        let Some(last) = rows.last() else {
            return Err(StatArbError::InsufficientData(
                "Performance analysis needs at least one backtest row".into(),
            ));
        };

        let ppy = f64::from(self.config.periods_per_year);
        let rf = self.config.risk_free_rate;
        let returns: Vec<f64> = rows.iter().map(|r| r.net_return).collect();
        let values: Vec<f64> = rows.iter().map(|r| r.portfolio_value).collect();

        let dd = max_drawdown(&values)?;

        let total_days = rows.len();
        let trading_days = rows.iter().filter(|r| !r.position.is_flat()).count();

        let metrics = PerformanceMetrics {
            total_return: last.cumulative_return,
            annual_return: annual_return(&returns, ppy),
            annual_volatility: annual_volatility(&returns, ppy),
            sharpe_ratio: sharpe_ratio(&returns, rf, ppy),
            sortino_ratio: sortino_ratio(&returns, rf, ppy),
            calmar_ratio: calmar_ratio(&returns, dd.max_drawdown, ppy),
            max_drawdown: dd.max_drawdown,
            peak_date: rows[dd.peak_index].timestamp,
            trough_date: rows[dd.trough_index].timestamp,
            recovery_date: dd.recovery_index.map(|i| rows[i].timestamp),
            peak_value: dd.peak_value,
            trough_value: dd.trough_value,
            win_rate: win_rate(&returns),
            profit_factor: profit_factor(&returns),
            total_days,
            trading_days,
            days_in_market: trading_days as f64 / total_days as f64,
        };

        info!(
            total_return = format!("{:.4}", metrics.total_return),
            sharpe = format!("{:.2}", metrics.sharpe_ratio),
            max_drawdown = format!("{:.4}", metrics.max_drawdown),
            "Performance analysed"
        );
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Position;

    fn row(day: u32, position: Position, net_return: f64, cumulative: f64) -> BacktestRow {
        BacktestRow {
            timestamp: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            position,
            position_change: 0.0,
            symbol1_return: 0.0,
            symbol2_return: 0.0,
            strategy_return: net_return,
            transaction_costs: 0.0,
            slippage: 0.0,
            net_return,
            cumulative_return: cumulative,
            portfolio_value: 1000.0 * (1.0 + cumulative),
        }
    }

    fn curve(values: &[f64], positions: &[Position]) -> Vec<BacktestRow> {
        let mut prev = 1000.0;
        values
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(i, (v, p))| {
                let r = v / prev - 1.0;
                prev = *v;
                row(i as u32 + 1, *p, r, v / 1000.0 - 1.0)
            })
            .collect()
    }

    #[test]
    fn test_drawdown_dates() {
        use Position::*;
        let rows = curve(&[1000.0, 1100.0, 900.0, 950.0, 1150.0], &[Long, Long, Long, Flat, Flat]);
        let m = PerformanceAnalyzer::default().analyze_performance(&rows).unwrap();
        assert!((m.max_drawdown + 200.0 / 1100.0).abs() < 1e-9);
        assert_eq!(m.peak_date, rows[1].timestamp);
        assert_eq!(m.trough_date, rows[2].timestamp);
        assert_eq!(m.recovery_date, Some(rows[4].timestamp));
        assert_eq!(m.total_days, 5);
        assert_eq!(m.trading_days, 3);
        assert!((m.days_in_market - 0.6).abs() < 1e-12);
        assert!((m.total_return - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_flat_run() {
        let rows: Vec<BacktestRow> = (1..=4).map(|d| row(d, Position::Flat, 0.0, 0.0)).collect();
        let m = PerformanceAnalyzer::default().analyze_performance(&rows).unwrap();
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.sortino_ratio, 0.0);
        assert_eq!(m.calmar_ratio, 0.0);
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        // never below the peak: recovered at the first row
        assert_eq!(m.recovery_date, Some(rows[0].timestamp));
        assert_eq!(m.days_in_market, 0.0);
    }

    #[test]
    fn test_rates_are_per_backtest_row() {
        use Position::*;
        let rows = vec![
            row(2, Long, 0.01, 0.01),
            row(3, Long, -0.01, 0.0),
            row(4, Flat, 0.02, 0.02),
            row(5, Flat, 0.0, 0.02),
        ];
        let m = PerformanceAnalyzer::default().analyze_performance(&rows).unwrap();
        assert_eq!(m.total_days, 4);
        assert_eq!(m.trading_days, 2);
        assert_eq!(m.win_rate, 0.5);
        assert_eq!(m.days_in_market, 0.5);
    }

    #[test]
    fn test_empty_rows() {
        assert!(matches!(
            PerformanceAnalyzer::default().analyze_performance(&[]),
            Err(StatArbError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_infinite_ratios_serialize_as_null() {
        use Position::*;
        let rows = curve(&[1010.0, 1020.0], &[Long, Long]);
        let m = PerformanceAnalyzer::default().analyze_performance(&rows).unwrap();
        assert_eq!(m.profit_factor, f64::INFINITY);
        let json = serde_json::to_value(&m).unwrap();
        assert!(json["profit_factor"].is_null());
    }
}
