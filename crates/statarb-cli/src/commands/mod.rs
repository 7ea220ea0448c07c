pub mod backtest;
pub mod pairs;
pub mod performance;
pub mod pipeline;
pub mod signals;

use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use statarb_core::pair_selection::{compute_spread, PairCandidate, PairSelector};
use statarb_core::pipeline::PipelineConfig;
use statarb_core::stats::ols_with_intercept;
use statarb_core::PriceTable;
use tracing::info;

use crate::input;

/// Where prices and configuration come from
#[derive(Args)]
pub struct DataArgs {
    /// Price table: .csv (date,SYM1,SYM2,...) or .json; JSON on stdin when omitted
    #[arg(long)]
    pub prices: Option<String>,

    /// Configuration file (.json, .yaml or .yml); flags override its values
    #[arg(long)]
    pub config: Option<String>,
}

impl DataArgs {
    pub fn load(&self) -> Result<(PriceTable, PipelineConfig), Box<dyn std::error::Error>> {
        let config: PipelineConfig = match self.config {
            Some(ref path) => input::file::read_config(path)?,
            None => PipelineConfig::default(),
        };
        let prices = input::prices::load_prices(self.prices.as_deref())?;
        Ok((prices, config))
    }
}

/// Pair selection overrides
#[derive(Args)]
pub struct SelectorOverrides {
    /// Minimum |correlation| for the strict scan
    #[arg(long)]
    pub min_correlation: Option<f64>,

    /// Cointegration p-value threshold for the strict scan
    #[arg(long)]
    pub pvalue_threshold: Option<f64>,

    /// Maximum half-life (periods) for fallback candidates
    #[arg(long)]
    pub max_half_life: Option<f64>,

    /// Disable the fallback levels
    #[arg(long)]
    pub no_fallback: bool,
}

impl SelectorOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        let selector = &mut config.selector;
        if let Some(v) = self.min_correlation {
            selector.min_correlation = v;
        }
        if let Some(v) = self.pvalue_threshold {
            selector.pvalue_threshold = v;
        }
        if let Some(v) = self.max_half_life {
            selector.max_half_life = v;
        }
        if self.no_fallback {
            selector.use_fallback = false;
        }
    }
}

/// Signal generator overrides
#[derive(Args)]
pub struct SignalOverrides {
    /// |z| that opens a position
    #[arg(long)]
    pub entry_threshold: Option<f64>,

    /// |z| inside which a position closes
    #[arg(long)]
    pub exit_threshold: Option<f64>,

    /// |z| that stops out a position
    #[arg(long)]
    pub stop_loss: Option<f64>,

    /// Rolling z-score window
    #[arg(long, conflicts_with = "expanding")]
    pub lookback: Option<usize>,

    /// Use expanding (all-history) z-score statistics
    #[arg(long)]
    pub expanding: bool,
}

impl SignalOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        let signals = &mut config.signals;
        if let Some(v) = self.entry_threshold {
            signals.entry_threshold = v;
        }
        if let Some(v) = self.exit_threshold {
            signals.exit_threshold = v;
        }
        if let Some(v) = self.stop_loss {
            signals.stop_loss = v;
        }
        if let Some(v) = self.lookback {
            signals.lookback_window = Some(v);
        }
        if self.expanding {
            signals.lookback_window = None;
        }
    }
}

/// Backtest overrides
#[derive(Args)]
pub struct BacktestOverrides {
    /// Starting capital
    #[arg(long)]
    pub initial_capital: Option<Decimal>,

    /// Transaction cost per unit of position change (0.001 = 0.1%)
    #[arg(long)]
    pub transaction_cost: Option<f64>,

    /// Slippage per unit of position change
    #[arg(long)]
    pub slippage: Option<f64>,
}

impl BacktestOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        let backtest = &mut config.backtest;
        if let Some(v) = self.initial_capital {
            backtest.initial_capital = v;
        }
        if let Some(v) = self.transaction_cost {
            backtest.transaction_cost = v;
        }
        if let Some(v) = self.slippage {
            backtest.slippage = v;
        }
    }
}

/// Explicit pair instead of running pair selection
#[derive(Args)]
pub struct PairArgs {
    /// Regressor leg (spread = symbol2 - hedge_ratio * symbol1)
    #[arg(long, requires = "symbol2")]
    pub symbol1: Option<String>,

    /// Dependent leg
    #[arg(long, requires = "symbol1")]
    pub symbol2: Option<String>,
}

/// The pair a command trades, with its hedge ratio and spread.
pub struct ResolvedPair {
    pub symbol1: String,
    pub symbol2: String,
    pub hedge_ratio: f64,
    pub spread: Vec<f64>,
    /// Present when the pair came from the selector
    pub candidate: Option<PairCandidate>,
}

/// Pair header attached to signal and backtest output. The selection
/// statistics are present only when the selector chose the pair.
#[derive(Debug, Serialize)]
pub struct PairSummary {
    pub symbol1: String,
    pub symbol2: String,
    pub hedge_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cointegration_pvalue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half_life: Option<f64>,
}

impl ResolvedPair {
    pub fn summary(&self) -> PairSummary {
        let c = self.candidate.as_ref();
        PairSummary {
            symbol1: self.symbol1.clone(),
            symbol2: self.symbol2.clone(),
            hedge_ratio: self.hedge_ratio,
            selection_level: c.map(|c| c.selection_level.clone()),
            correlation: c.map(|c| c.correlation),
            cointegration_pvalue: c.map(|c| c.cointegration_pvalue),
            half_life: c.map(|c| c.half_life),
        }
    }
}

impl PairArgs {
    pub fn resolve(
        &self,
        prices: &PriceTable,
        config: &PipelineConfig,
    ) -> Result<ResolvedPair, Box<dyn std::error::Error>> {
        match (&self.symbol1, &self.symbol2) {
            (Some(s1), Some(s2)) => {
                let p1 = prices.require_column(s1)?;
                let p2 = prices.require_column(s2)?;
                let fit = ols_with_intercept(p2, p1)?;
                info!(pair = format!("{}-{}", s1, s2), hedge_ratio = fit.slope, "Using explicit pair");
                Ok(ResolvedPair {
                    symbol1: s1.clone(),
                    symbol2: s2.clone(),
                    hedge_ratio: fit.slope,
                    spread: compute_spread(p1, p2, fit.slope),
                    candidate: None,
                })
            }
            _ => {
                let selector = PairSelector::new(config.selector.clone());
                let candidate = selector.select(prices)?;
                Ok(ResolvedPair {
                    symbol1: candidate.symbol1.clone(),
                    symbol2: candidate.symbol2.clone(),
                    hedge_ratio: candidate.hedge_ratio,
                    spread: candidate.spread.clone(),
                    candidate: Some(candidate),
                })
            }
        }
    }
}

/// Performance analysis overrides
#[derive(Args)]
pub struct PerformanceOverrides {
    /// Annual risk-free rate for Sharpe and Sortino
    #[arg(long)]
    pub risk_free_rate: Option<f64>,

    /// Return periods per year used for annualisation
    #[arg(long)]
    pub periods_per_year: Option<u32>,
}

impl PerformanceOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        let performance = &mut config.performance;
        if let Some(v) = self.risk_free_rate {
            performance.risk_free_rate = v;
        }
        if let Some(v) = self.periods_per_year {
            performance.periods_per_year = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use statarb_core::PriceSeries;

    /// BBB = 5 + 2 * AAA plus white noise; CCC an independent walk.
    fn table() -> PriceTable {
        let n = 300;
        let mut rng = StdRng::seed_from_u64(3);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let index = (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect();
        let (mut walk, mut other) = (100.0, 100.0);
        let (mut a, mut b, mut c) = (Vec::new(), Vec::new(), Vec::new());
        for _ in 0..n {
            walk += rng.gen_range(-1.0..1.0);
            other += rng.gen_range(-1.0..1.0);
            a.push(walk);
            b.push(5.0 + 2.0 * walk + rng.gen_range(-0.5..0.5));
            c.push(other);
        }
        PriceTable::new(
            index,
            vec![
                PriceSeries { symbol: "AAA".into(), prices: a },
                PriceSeries { symbol: "BBB".into(), prices: b },
                PriceSeries { symbol: "CCC".into(), prices: c },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_selected_pair_carries_selection_stats() {
        let args = PairArgs { symbol1: None, symbol2: None };
        let pair = args.resolve(&table(), &PipelineConfig::default()).unwrap();
        let summary = pair.summary();
        assert_eq!((summary.symbol1.as_str(), summary.symbol2.as_str()), ("AAA", "BBB"));
        assert_eq!(summary.selection_level.as_deref(), Some("strict"));
        assert!(summary.cointegration_pvalue.unwrap() < 0.05);
        assert!(summary.correlation.unwrap() > 0.7);
        assert!(summary.half_life.is_some());
    }

    #[test]
    fn test_explicit_pair_omits_selection_stats() {
        let args = PairArgs {
            symbol1: Some("AAA".into()),
            symbol2: Some("BBB".into()),
        };
        let pair = args.resolve(&table(), &PipelineConfig::default()).unwrap();
        assert!((pair.hedge_ratio - 2.0).abs() < 0.05);
        let json = serde_json::to_value(pair.summary()).unwrap();
        assert_eq!(json["symbol1"], "AAA");
        assert!(json.get("selection_level").is_none());
        assert!(json.get("cointegration_pvalue").is_none());
    }

    #[test]
    fn test_explicit_pair_unknown_symbol() {
        let args = PairArgs {
            symbol1: Some("AAA".into()),
            symbol2: Some("ZZZ".into()),
        };
        assert!(args.resolve(&table(), &PipelineConfig::default()).is_err());
    }
}
