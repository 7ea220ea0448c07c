use clap::Args;
use serde_json::Value;

use statarb_core::pipeline::run_pipeline;

use super::{BacktestOverrides, DataArgs, PerformanceOverrides, SelectorOverrides, SignalOverrides};

/// Arguments for the full pipeline
#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub selector: SelectorOverrides,

    #[command(flatten)]
    pub signals: SignalOverrides,

    #[command(flatten)]
    pub backtest: BacktestOverrides,

    #[command(flatten)]
    pub performance: PerformanceOverrides,
}

pub fn run(args: RunArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (prices, mut config) = args.data.load()?;
    args.selector.apply(&mut config);
    args.signals.apply(&mut config);
    args.backtest.apply(&mut config);
    args.performance.apply(&mut config);

    let result = run_pipeline(&prices, &config)?;
    Ok(serde_json::to_value(result)?)
}
