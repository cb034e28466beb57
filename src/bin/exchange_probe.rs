//! Exchange Probe
//!
//! Fetches loan and staking tables from each enabled exchange and prints
//! what was normalized. Useful for checking credentials and endpoint drift.
//!
//! Usage:
//!   exchange_probe --exchange okx --rows 10
//!   exchange_probe --json

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use carrybot::config::{load_env, AppConfig};
use carrybot::exchanges::SnapshotCollector;
use carrybot::models::ExchangeSnapshot;

#[derive(Parser, Debug)]
#[command(name = "exchange_probe")]
#[command(about = "Dump normalized rate tables per exchange")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CARRYBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Only probe this exchange (bybit, okx, binance)
    #[arg(short, long)]
    exchange: Option<String>,

    /// Rows to print per table
    #[arg(short, long, default_value = "15")]
    rows: usize,

    /// Emit snapshots as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    load_env();
    carrybot::init_tracing("carrybot=debug");

    let mut config =
        AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(only) = args.exchange.as_deref() {
        let exchanges = &mut config.exchanges;
        match only.to_lowercase().as_str() {
            "bybit" | "okx" | "binance" => {}
            other => bail!("Unknown exchange '{}' (expected bybit, okx or binance)", other),
        }
        exchanges.bybit.enabled = only.eq_ignore_ascii_case("bybit");
        exchanges.okx.enabled = only.eq_ignore_ascii_case("okx");
        exchanges.binance.enabled = only.eq_ignore_ascii_case("binance");
    }

    let collector = SnapshotCollector::from_config(&config.exchanges)?;
    let snapshots = collector.collect().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    for snapshot in &snapshots {
        print_snapshot(snapshot, args.rows);
    }
    Ok(())
}

fn print_snapshot(snapshot: &ExchangeSnapshot, rows: usize) {
    println!("\n=== {} ===", snapshot.exchange_name);
    println!(
        "loans: {}  staking: {}  common: {}",
        snapshot.loan_rates.len(),
        snapshot.staking_rates.len(),
        snapshot.common_coins().count()
    );

    println!("\n{:<10} {:>10} {:>14} {:>14}", "Loan", "Rate %", "Min", "Max");
    for (coin, quote) in snapshot.loan_rates.iter().take(rows) {
        println!(
            "{:<10} {:>10.4} {:>14} {:>14}",
            coin.as_str(),
            quote.rate,
            quote.min_amount,
            quote.max_amount
        );
    }

    println!("\n{:<10} {:>10} {:>14} {:>14}", "Staking", "APY %", "Min", "Max");
    for (coin, quote) in snapshot.staking_rates.iter().take(rows) {
        println!(
            "{:<10} {:>10.2} {:>14} {:>14}",
            coin.as_str(),
            quote.apy,
            quote.min_amount,
            quote.max_amount
        );
    }
}
