//! Carrybot - one-shot loan/staking spread scan
//!
//! Polls every enabled exchange, ranks intra- and cross-exchange carry
//! opportunities, prints console tables and pushes Telegram reports.
//!
//! Usage:
//!   carrybot --config carrybot.toml --threshold 0.5 --top 20
//!   carrybot --generate-config > carrybot.toml

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use carrybot::config::{default_config_template, load_env, AppConfig};
use carrybot::scanner::{ConsoleOutput, Scanner};

#[derive(Parser, Debug)]
#[command(name = "carrybot")]
#[command(about = "Find borrow-then-stake spreads across Bybit, OKX and Binance")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CARRYBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Minimum net profit in percentage points
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Rows per table / Telegram report
    #[arg(long)]
    top: Option<usize>,

    /// Skip Telegram notifications
    #[arg(long)]
    no_telegram: bool,

    /// Print the full report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Print a configuration template and exit
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.generate_config {
        print!("{}", default_config_template());
        return Ok(());
    }

    load_env();
    carrybot::init_tracing("carrybot=info");

    let mut config =
        AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(threshold) = args.threshold {
        config.arbitrage.min_profit_threshold = threshold;
    }
    if let Some(top) = args.top {
        config.arbitrage.report_top_n = top;
    }
    if args.no_telegram || args.json {
        config.telegram.enabled = false;
    }
    config.validate().context("Invalid command-line overrides")?;

    info!(
        threshold = config.arbitrage.min_profit_threshold,
        top = config.arbitrage.report_top_n,
        telegram = config.telegram.is_active(),
        "🚀 Starting carry scan"
    );

    let scanner = Scanner::from_config(&config)?;

    if args.json {
        let report = scanner.run_once(ConsoleOutput::Silent).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let output = if args.no_color {
        ConsoleOutput::Plain
    } else {
        ConsoleOutput::Colored
    };
    scanner.run_once(output).await?;
    Ok(())
}
