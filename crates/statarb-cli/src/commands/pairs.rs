use clap::Args;
use serde_json::Value;
use std::time::Instant;

use statarb_core::pair_selection::PairSelector;
use statarb_core::with_metadata;

use super::{DataArgs, SelectorOverrides};

/// Arguments for pair selection
#[derive(Args)]
pub struct SelectPairArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub selector: SelectorOverrides,

    /// List every pair accepted by the strict scan instead of the single best
    #[arg(long)]
    pub all: bool,
}

pub fn run_select_pair(args: SelectPairArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (prices, mut config) = args.data.load()?;
    args.selector.apply(&mut config);
    config.selector.validate()?;

    let start = Instant::now();
    let selector = PairSelector::new(config.selector.clone());

    if args.all {
        let pairs = selector.find_cointegrated_pairs(&prices, config.selector.min_correlation);
        let mut warnings = Vec::new();
        if pairs.is_empty() {
            warnings.push(format!(
                "No pair passed |correlation| >= {} and p < {}",
                config.selector.min_correlation, config.selector.pvalue_threshold
            ));
        }
        let output = with_metadata(
            "Engle-Granger cointegration scan over all symbol pairs",
            &config.selector,
            warnings,
            start.elapsed().as_micros() as u64,
            pairs,
        );
        return Ok(serde_json::to_value(output)?);
    }

    let pair = selector.select(&prices)?;
    let mut warnings = Vec::new();
    if pair.selection_level != "strict" {
        warnings.push(format!(
            "{} accepted by the '{}' fallback level (p = {:.4})",
            pair.label(),
            pair.selection_level,
            pair.cointegration_pvalue
        ));
    }
    let output = with_metadata(
        "Engle-Granger pair selection with correlation fallback",
        &config.selector,
        warnings,
        start.elapsed().as_micros() as u64,
        pair,
    );
    Ok(serde_json::to_value(output)?)
}
