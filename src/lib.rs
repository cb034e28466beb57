//! Carrybot Library
//!
//! Loan/staking spread scanner for Bybit, OKX and Binance.
//! Binaries: `carrybot` (one-shot scan), `carrybot_telegram` (interactive bot),
//! `exchange_probe` (per-exchange diagnostics).

pub mod arbitrage;
pub mod config;
pub mod exchanges;
pub mod models;
pub mod report;
pub mod scanner;
pub mod telegram;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `RUST_LOG` wins; otherwise `default_filter` (e.g. `carrybot=info`).
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
