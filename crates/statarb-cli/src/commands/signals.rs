use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use statarb_core::signals::{SignalGenerator, SignalTable};
use statarb_core::with_metadata;

use super::{DataArgs, PairArgs, PairSummary, SelectorOverrides, SignalOverrides};

/// Arguments for signal generation
#[derive(Args)]
pub struct SignalsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub pair: PairArgs,

    #[command(flatten)]
    pub selector: SelectorOverrides,

    #[command(flatten)]
    pub signals: SignalOverrides,
}

#[derive(Serialize)]
struct SignalsCommandOutput {
    pair: PairSummary,
    #[serde(flatten)]
    table: SignalTable,
}

pub fn run_signals(args: SignalsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (prices, mut config) = args.data.load()?;
    args.selector.apply(&mut config);
    args.signals.apply(&mut config);
    config.selector.validate()?;

    let start = Instant::now();
    let pair = args.pair.resolve(&prices, &config)?;

    let generator = SignalGenerator::new(config.signals.clone());
    let mut warnings = generator.config().validate()?;
    let table = generator.generate_signals(prices.index(), &pair.spread, pair.hedge_ratio)?;
    if table.entry_count() == 0 {
        warnings.push(format!(
            "{}-{}: no |z| exceeded the entry threshold {}",
            pair.symbol1, pair.symbol2, config.signals.entry_threshold
        ));
    }

    let output = with_metadata(
        "Z-score mean-reversion state machine",
        &config.signals,
        warnings,
        start.elapsed().as_micros() as u64,
        SignalsCommandOutput {
            pair: pair.summary(),
            table,
        },
    );
    Ok(serde_json::to_value(output)?)
}
