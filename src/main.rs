//! Credit spread backtest CLI.
//!
//! # Run a backtest over a tick file
//! credit-spread-backtest run --data data/spy_2025-06-16.csv --config config/default.toml
//!
//! # Check a tick file before running it
//! credit-spread-backtest validate --data data/spy_2025-06-16.csv

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use credit_spread_backtest::{
    BacktestConfig, BacktestEngine, MetricsCalculator, TickLoader, TickStreamValidator,
};

#[derive(Parser)]
#[command(name = "credit-spread-backtest")]
#[command(about = "Intraday credit put spread backtester")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest over a tick CSV file
    Run {
        /// Path to tick CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Path to configuration file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the iteration cap
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Print every trade
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check a tick CSV file for integrity problems
    Validate {
        /// Path to tick CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Minimum share of ticks that must carry an underlying price
        #[arg(long, default_value_t = 0.5)]
        min_underlying_coverage: f64,
    },
}

fn cmd_run(
    data: PathBuf,
    config_path: Option<PathBuf>,
    max_iterations: Option<usize>,
    verbose: bool,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => BacktestConfig::default(),
    };
    config.apply_overrides(max_iterations);
    config.validate().context("Invalid configuration")?;

    let stream = TickLoader::new(&data)
        .load()
        .with_context(|| format!("Failed to load ticks: {}", data.display()))?;
    info!(
        timestamps = stream.len(),
        ticks = stream.tick_count(),
        "tick data loaded"
    );

    let result = BacktestEngine::new(config).run(&stream);

    println!(
        "Backtest finished: {} ({} iterations, {} trades)",
        result.stop_reason,
        result.iterations,
        result.total_trades()
    );

    if verbose {
        println!();
        for (i, trade) in result.outcomes.iter().enumerate() {
            println!(
                "{:>4}  {} -> {}  {:<16} {} / {}  credit {}  width {}  pnl ${:.2}",
                i + 1,
                trade.entry_time.format("%Y-%m-%d %H:%M"),
                trade.exit_time.format("%H:%M"),
                trade.status.as_str(),
                trade.short_symbol,
                trade.long_symbol,
                trade.credit_received,
                trade.spread_width,
                trade.theoretical_pnl
            );
        }
    }

    println!();
    println!("{}", MetricsCalculator::calculate(&result).summary());
    Ok(())
}

fn cmd_validate(data: PathBuf, min_underlying_coverage: f64) -> Result<()> {
    let stream = TickLoader::new(&data)
        .load()
        .with_context(|| format!("Failed to load ticks: {}", data.display()))?;

    let report = TickStreamValidator::new(min_underlying_coverage).validate(&stream);
    println!("{}", report.summary());
    for check in &report.checks {
        let mark = if check.passed { "PASS" } else { "FAIL" };
        println!("  [{}] {}: {}", mark, check.name, check.message);
        if let Some(details) = &check.details {
            println!("         {}", details);
        }
    }

    let failed = report.failed_checks().len();
    if failed > 0 {
        bail!("{} integrity checks failed", failed);
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("credit_spread_backtest=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            config,
            max_iterations,
            verbose,
        } => cmd_run(data, config, max_iterations, verbose)?,
        Commands::Validate {
            data,
            min_underlying_coverage,
        } => cmd_validate(data, min_underlying_coverage)?,
    }

    Ok(())
}
