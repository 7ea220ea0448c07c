//! End-to-end run: pair selection, signals, backtest, performance.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

use crate::backtest::{BacktestConfig, BacktestReport, Backtester};
use crate::pair_selection::{PairCandidate, PairSelector, SelectorConfig};
use crate::performance::{PerformanceAnalyzer, PerformanceConfig, PerformanceMetrics};
use crate::signals::{SignalConfig, SignalGenerator, SignalTable};
use crate::types::{with_metadata, ComputationOutput, PriceTable};
use crate::StatArbResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl PipelineConfig {
    /// Validate every stage; returns the non-fatal warnings.
    pub fn validate(&self) -> StatArbResult<Vec<String>> {
        self.selector.validate()?;
        let warnings = self.signals.validate()?;
        self.backtest.validate()?;
        self.performance.validate()?;
        Ok(warnings)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub pair: PairCandidate,
    pub signals: SignalTable,
    pub backtest: BacktestReport,
    pub metrics: PerformanceMetrics,
}

/// Run all four stages on `prices` with one configuration.
pub fn run_pipeline(
    prices: &PriceTable,
    config: &PipelineConfig,
) -> StatArbResult<ComputationOutput<PipelineOutput>> {
    let start = Instant::now();
    let mut warnings = config.validate()?;

    info!(
        symbols = prices.symbols().len(),
        periods = prices.len(),
        "Running pair-trading pipeline"
    );

    let selector = PairSelector::new(config.selector.clone());
    let pair = selector.select(prices)?;
    if pair.selection_level != "strict" {
        warnings.push(format!(
            "{} is not cointegrated at p < {}; accepted by the '{}' fallback level (p = {:.4})",
            pair.label(),
            config.selector.pvalue_threshold,
            pair.selection_level,
            pair.cointegration_pvalue
        ));
    }
    if !pair.half_life.is_finite() {
        warnings.push(format!("{} spread shows no mean reversion (infinite half-life)", pair.label()));
    }

    let generator = SignalGenerator::new(config.signals.clone());
    let signals = generator.generate_signals(prices.index(), &pair.spread, pair.hedge_ratio)?;
    if signals.entry_count() == 0 {
        warnings.push("No entry signals were generated; the backtest holds cash throughout".into());
    }

    let backtester = Backtester::new(config.backtest.clone());
    let backtest = backtester.run_backtest(&signals, prices, &pair.symbol1, &pair.symbol2)?;

    let analyzer = PerformanceAnalyzer::new(config.performance.clone());
    let metrics = analyzer.analyze_performance(&backtest.rows)?;

    for w in &warnings {
        warn!(warning = %w, "Pipeline");
    }

    let output = PipelineOutput {
        pair,
        signals,
        backtest,
        metrics,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Engle-Granger pair selection with z-score mean-reversion signals and cost-aware backtest",
        config,
        warnings,
        elapsed,
        output,
    ))
}
