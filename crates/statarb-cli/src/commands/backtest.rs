use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use statarb_core::backtest::{BacktestReport, Backtester};
use statarb_core::signals::{position_sizes, PositionSize, SignalGenerator};
use statarb_core::with_metadata;

use super::{
    BacktestOverrides, DataArgs, PairArgs, PairSummary, SelectorOverrides, SignalOverrides,
};

/// Arguments for a single-pair backtest
#[derive(Args)]
pub struct BacktestCmdArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub pair: PairArgs,

    #[command(flatten)]
    pub selector: SelectorOverrides,

    #[command(flatten)]
    pub signals: SignalOverrides,

    #[command(flatten)]
    pub backtest: BacktestOverrides,

    /// Include equal-dollar share counts per period
    #[arg(long)]
    pub sizes: bool,
}

#[derive(Serialize)]
struct BacktestCommandOutput {
    pair: PairSummary,
    #[serde(flatten)]
    report: BacktestReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    position_sizes: Option<Vec<PositionSize>>,
}

pub fn run_backtest(args: BacktestCmdArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (prices, mut config) = args.data.load()?;
    args.selector.apply(&mut config);
    args.signals.apply(&mut config);
    args.backtest.apply(&mut config);
    let mut warnings = config.validate()?;

    let start = Instant::now();
    let pair = args.pair.resolve(&prices, &config)?;

    let generator = SignalGenerator::new(config.signals.clone());
    let signals = generator.generate_signals(prices.index(), &pair.spread, pair.hedge_ratio)?;
    if signals.entry_count() == 0 {
        warnings.push("No entry signals were generated; the backtest holds cash throughout".into());
    }

    let backtester = Backtester::new(config.backtest.clone());
    let report = backtester.run_backtest(&signals, &prices, &pair.symbol1, &pair.symbol2)?;

    let sizes = if args.sizes {
        Some(position_sizes(
            &signals,
            &prices,
            &pair.symbol1,
            &pair.symbol2,
            config.backtest.initial_capital,
        )?)
    } else {
        None
    };

    let output = with_metadata(
        "Dollar-neutral spread backtest with proportional costs and slippage",
        &config,
        warnings,
        start.elapsed().as_micros() as u64,
        BacktestCommandOutput {
            pair: pair.summary(),
            report,
            position_sizes: sizes,
        },
    );
    Ok(serde_json::to_value(output)?)
}
