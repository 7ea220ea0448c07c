use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StatArbError;
use crate::signals::{Position, SignalTable};
use crate::types::{Money, PriceTable, Rate};
use crate::StatArbResult;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Money,

    /// Charged per unit of position change (0.001 = 0.1%)
    #[serde(default = "default_transaction_cost")]
    pub transaction_cost: Rate,

    /// Charged per unit of position change
    #[serde(default = "default_slippage")]
    pub slippage: Rate,
}

fn default_initial_capital() -> Money {
    dec!(100_000)
}
fn default_transaction_cost() -> Rate {
    0.001
}
fn default_slippage() -> Rate {
    0.0005
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            transaction_cost: default_transaction_cost(),
            slippage: default_slippage(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> StatArbResult<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(StatArbError::InvalidInput {
                field: "initial_capital".into(),
                reason: "Initial capital must be positive".into(),
            });
        }
        for (field, rate) in [
            ("transaction_cost", self.transaction_cost),
            ("slippage", self.slippage),
        ] {
            if !(rate.is_finite() && rate >= 0.0) {
                return Err(StatArbError::InvalidInput {
                    field: field.into(),
                    reason: "Rate must be finite and non-negative".into(),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One simulated period. Returns are decimals, never percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRow {
    pub timestamp: NaiveDate,
    /// Position held at the end of this period
    pub position: Position,
    /// |position[t] - position[t-1]|
    pub position_change: f64,
    pub symbol1_return: f64,
    pub symbol2_return: f64,
    /// Earned by the position held over the period, i.e. position[t-1]
    pub strategy_return: f64,
    pub transaction_costs: f64,
    pub slippage: f64,
    pub net_return: f64,
    pub cumulative_return: f64,
    pub portfolio_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol1: String,
    pub symbol2: String,
    pub rows: Vec<BacktestRow>,
    pub total_return: f64,
    pub final_value: Money,
    pub total_entries: u32,
    pub total_exits: u32,
    /// Σ (transaction costs + slippage) as a return fraction
    pub total_costs: f64,
    /// total_costs in currency: total_costs * initial_capital
    pub total_cost_amount: Money,
    pub initial_capital: Money,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Backtester {
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Per-period returns for t >= 1.
    ///
    /// The return of period t is earned by position[t-1]; a position opened
    /// at t only starts earning at t+1.
    pub fn calculate_returns(
        &self,
        signals: &SignalTable,
        prices: &PriceTable,
        symbol1: &str,
        symbol2: &str,
    ) -> StatArbResult<Vec<BacktestRow>> {
        self.config.validate()?;
        let r1 = prices.simple_returns(symbol1)?;
        let r2 = prices.simple_returns(symbol2)?;

        if signals.records.len() < 2 {
            return Err(StatArbError::InsufficientData(format!(
                "Backtest needs at least 2 periods, got {}",
                signals.records.len()
            )));
        }
        if signals.timestamps() != prices.index() {
            return Err(StatArbError::InvalidInput {
                field: "signals".into(),
                reason: "Signal timestamps must match the price index".into(),
            });
        }

        let capital = self
            .config
            .initial_capital
            .to_f64()
            .ok_or_else(|| StatArbError::InvalidInput {
                field: "initial_capital".into(),
                reason: "Not representable as f64".into(),
            })?;

        let mut growth = 1.0;
        let rows = signals
            .records
            .windows(2)
            .zip(r1.iter().zip(&r2))
            .map(|(pair, (ret1, ret2))| {
                let prev = pair[0].position;
                let curr = pair[1].position;

                let strategy_return = match prev {
                    Position::Flat => 0.0,
                    Position::Long => ret2 - ret1,
                    Position::Short => ret1 - ret2,
                };
                let position_change = f64::from((curr.as_i8() - prev.as_i8()).abs());
                let transaction_costs = position_change * self.config.transaction_cost;
                let slippage = position_change * self.config.slippage;
                let net_return = strategy_return - transaction_costs - slippage;

                growth *= 1.0 + net_return;
                let cumulative_return = growth - 1.0;

                BacktestRow {
                    timestamp: pair[1].timestamp,
                    position: curr,
                    position_change,
                    symbol1_return: *ret1,
                    symbol2_return: *ret2,
                    strategy_return,
                    transaction_costs,
                    slippage,
                    net_return,
                    cumulative_return,
                    portfolio_value: capital * (1.0 + cumulative_return),
                }
            })
            .collect();

        Ok(rows)
    }

    /// Simulate the signal table and summarise the run.
    pub fn run_backtest(
        &self,
        signals: &SignalTable,
        prices: &PriceTable,
        symbol1: &str,
        symbol2: &str,
    ) -> StatArbResult<BacktestReport> {
        let rows = self.calculate_returns(signals, prices, symbol1, symbol2)?;

        let total_return = rows.last().map(|r| r.cumulative_return).unwrap_or(0.0);
        let total_costs: f64 = rows.iter().map(|r| r.transaction_costs + r.slippage).sum();
        let total_entries: u32 = signals
            .records
            .iter()
            .map(|r| u32::from(r.entry_signal.unsigned_abs()))
            .sum();
        let total_exits: u32 = signals.records.iter().map(|r| u32::from(r.exit_signal)).sum();

        let capital = self.config.initial_capital;
        let final_value = (capital * to_decimal("total_return", 1.0 + total_return)?).round_dp(2);
        let total_cost_amount = (capital * to_decimal("total_costs", total_costs)?).round_dp(2);

        info!(
            pair = format!("{}-{}", symbol1, symbol2),
            periods = rows.len(),
            total_return = format!("{:.4}", total_return),
            entries = total_entries,
            exits = total_exits,
            "Backtest complete"
        );

        Ok(BacktestReport {
            symbol1: symbol1.to_string(),
            symbol2: symbol2.to_string(),
            rows,
            total_return,
            final_value,
            total_entries,
            total_exits,
            total_costs,
            total_cost_amount,
            initial_capital: capital,
        })
    }
}

fn to_decimal(field: &str, value: f64) -> StatArbResult<Decimal> {
    Decimal::try_from(value).map_err(|e| StatArbError::InvalidInput {
        field: field.into(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalRecord;
    use crate::types::PriceSeries;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    fn table(p1: Vec<f64>, p2: Vec<f64>) -> PriceTable {
        let index = (1..=p1.len() as u32).map(d).collect();
        PriceTable::new(
            index,
            vec![
                PriceSeries { symbol: "A".into(), prices: p1 },
                PriceSeries { symbol: "B".into(), prices: p2 },
            ],
        )
        .unwrap()
    }

    fn signals(positions: &[Position]) -> SignalTable {
        let mut prev = Position::Flat;
        let records = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let entry_signal = if prev.is_flat() && !p.is_flat() { p.as_i8() } else { 0 };
                let exit_signal = u8::from(!prev.is_flat() && p.is_flat());
                prev = *p;
                SignalRecord {
                    timestamp: d(i as u32 + 1),
                    spread: 0.0,
                    zscore: 0.0,
                    position: *p,
                    entry_signal,
                    exit_signal,
                    exit_reason: None,
                }
            })
            .collect();
        SignalTable {
            hedge_ratio: 1.0,
            lookback_window: None,
            records,
        }
    }

    #[test]
    fn test_position_lag() {
        use Position::*;
        let prices = table(vec![100.0, 100.0, 110.0, 110.0], vec![100.0, 120.0, 120.0, 132.0]);
        let sig = signals(&[Flat, Long, Long, Flat]);
        let bt = Backtester::new(BacktestConfig {
            transaction_cost: 0.0,
            slippage: 0.0,
            ..Default::default()
        });
        let rows = bt.calculate_returns(&sig, &prices, "A", "B").unwrap();
        assert_eq!(rows.len(), 3);
        // the +20% move on the entry day is not captured
        assert_eq!(rows[0].strategy_return, 0.0);
        assert!((rows[1].strategy_return - (0.0 - 0.10)).abs() < 1e-12);
        assert!((rows[2].strategy_return - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_costs_scale_with_position_change() {
        use Position::*;
        let prices = table(vec![10.0; 4], vec![20.0; 4]);
        let sig = signals(&[Flat, Short, Flat, Long]);
        let rows = Backtester::default()
            .calculate_returns(&sig, &prices, "A", "B")
            .unwrap();
        assert_eq!(rows[0].position_change, 1.0);
        assert!((rows[0].transaction_costs - 0.001).abs() < 1e-15);
        assert!((rows[0].slippage - 0.0005).abs() < 1e-15);
        assert!((rows[0].net_return + 0.0015).abs() < 1e-15);
        assert_eq!(rows[1].position_change, 1.0);
        assert_eq!(rows[2].position_change, 1.0);
    }

    #[test]
    fn test_compounding_and_portfolio_value() {
        use Position::*;
        let prices = table(vec![100.0, 100.0, 100.0, 100.0], vec![100.0, 100.0, 110.0, 99.0]);
        let sig = signals(&[Flat, Long, Long, Long]);
        let report = Backtester::default()
            .run_backtest(&sig, &prices, "A", "B")
            .unwrap();
        let mut growth = 1.0;
        for row in &report.rows {
            growth *= 1.0 + row.net_return;
            assert!((row.cumulative_return - (growth - 1.0)).abs() < 1e-12);
            assert!((row.portfolio_value / 100_000.0 - 1.0 - row.cumulative_return).abs() < 1e-12);
        }
        assert_eq!(report.total_entries, 1);
        assert_eq!(report.total_exits, 0);
        assert!((report.total_costs - 0.0015).abs() < 1e-15);
        assert_eq!(report.total_cost_amount, dec!(150.00));
    }

    #[test]
    fn test_rejects_misaligned_signals() {
        let prices = table(vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]);
        let sig = signals(&[Position::Flat, Position::Flat]);
        assert!(Backtester::default()
            .calculate_returns(&sig, &prices, "A", "B")
            .is_err());
    }

    #[test]
    fn test_rejects_single_period() {
        let prices = table(vec![1.0], vec![1.0]);
        let sig = signals(&[Position::Flat]);
        assert!(matches!(
            Backtester::default().calculate_returns(&sig, &prices, "A", "B"),
            Err(StatArbError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_unknown_symbol() {
        let prices = table(vec![1.0, 2.0], vec![1.0, 2.0]);
        let sig = signals(&[Position::Flat, Position::Flat]);
        assert!(matches!(
            Backtester::default().calculate_returns(&sig, &prices, "A", "Q"),
            Err(StatArbError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let config = BacktestConfig {
            initial_capital: Decimal::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config: BacktestConfig = serde_json::from_str(r#"{"slippage": 0.0}"#).unwrap();
        assert_eq!(config.initial_capital, dec!(100000));
        assert_eq!(config.transaction_cost, 0.001);
        assert_eq!(config.slippage, 0.0);
    }
}
