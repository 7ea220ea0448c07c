use clap::Args;
use serde_json::Value;
use std::time::Instant;

use statarb_core::performance::max_drawdown;
use statarb_core::with_metadata;

use crate::input;

/// Arguments for drawdown analysis
#[derive(Args)]
pub struct DrawdownArgs {
    /// Comma-separated equity values; a JSON array on stdin when omitted
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub values: Vec<f64>,
}

pub fn run_drawdown(args: DrawdownArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let values: Vec<f64> = if !args.values.is_empty() {
        args.values
    } else if let Some(values) = input::stdin::read_stdin()? {
        values
    } else {
        return Err("--values <v1,v2,...> or a JSON array on stdin required".into());
    };

    let start = Instant::now();
    let info = max_drawdown(&values)?;
    let output = with_metadata(
        "Peak-to-trough decline of the running maximum",
        &serde_json::json!({ "observations": values.len() }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        info,
    );
    Ok(serde_json::to_value(output)?)
}
