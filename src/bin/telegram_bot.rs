//! Carrybot Telegram Bot
//!
//! Interactive bot answering /analyze, /status, /best_staking, /hot_loans.
//!
//! Usage:
//!   carrybot_telegram --config carrybot.toml --log-level debug
//!
//! Environment Variables:
//!   TELEGRAM_BOT_TOKEN - Bot token (required)
//!   TELEGRAM_CHAT_ID - Chat for push notifications (optional)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use carrybot::config::{load_env, AppConfig};
use carrybot::exchanges::SnapshotCollector;
use carrybot::scanner::Scanner;
use carrybot::telegram::{TelegramBot, TelegramNotifier};

#[derive(Parser, Debug)]
#[command(name = "carrybot_telegram")]
#[command(about = "Telegram front-end for the carry spread scanner")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CARRYBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    load_env();
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    carrybot::init_tracing(&format!("carrybot={}", level));

    let config =
        AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // replies go to whoever sent the command; the push notifier stays unused here
    let scanner = Arc::new(Scanner::new(
        SnapshotCollector::from_config(&config.exchanges)?,
        TelegramNotifier::disabled(),
        config.arbitrage.clone(),
    ));

    let bot = TelegramBot::new(&config.telegram, scanner)?;
    info!("🤖 Starting Telegram bot");

    tokio::select! {
        result = bot.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    }
}
