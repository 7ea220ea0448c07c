mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::backtest::BacktestCmdArgs;
use commands::pairs::SelectPairArgs;
use commands::performance::DrawdownArgs;
use commands::pipeline::RunArgs;
use commands::signals::SignalsArgs;

/// Statistical-arbitrage pair trading research
#[derive(Parser)]
#[command(
    name = "statarb",
    version,
    about = "Cointegration pair selection, z-score signals and cost-aware backtests",
    long_about = "Finds the strongest cointegrated pair in a price table, drives a \
                  mean-reversion state machine from its spread, simulates trading \
                  under transaction costs and slippage, and reports risk-adjusted \
                  performance. Prices come from a local CSV/JSON file or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log filter for stderr (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Select the best cointegrated pair from a price table
    SelectPair(SelectPairArgs),
    /// Generate z-score entry/exit signals for a pair
    Signals(SignalsArgs),
    /// Backtest the signals of a pair with costs and slippage
    Backtest(BacktestCmdArgs),
    /// Run selection, signals, backtest and performance analysis
    Run(RunArgs),
    /// Maximum drawdown of an equity curve
    Drawdown(DrawdownArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::SelectPair(args) => commands::pairs::run_select_pair(args),
        Commands::Signals(args) => commands::signals::run_signals(args),
        Commands::Backtest(args) => commands::backtest::run_backtest(args),
        Commands::Run(args) => commands::pipeline::run(args),
        Commands::Drawdown(args) => commands::performance::run_drawdown(args),
        Commands::Version => {
            println!("statarb {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
