//! Scanner Configuration
//!
//! TOML file for static settings, environment (and `.env`) for secrets.
//! Every section is optional; a missing file means defaults plus environment.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::arbitrage::engine::{
    OpportunityEngine, DEFAULT_HOT_LOAN_RATE_FLOOR, DEFAULT_MIN_PROFIT_THRESHOLD,
    DEFAULT_STAKING_APY_FLOOR,
};

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub arbitrage: ArbitrageConfig,
    #[serde(default)]
    pub exchanges: ExchangesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Long-poll timeout for getUpdates
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            chat_id: String::new(),
            enabled: true,
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    /// Enabled and carrying credentials
    pub fn is_active(&self) -> bool {
        self.enabled && !self.token.is_empty() && !self.chat_id.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageConfig {
    #[serde(default = "default_min_profit_threshold")]
    pub min_profit_threshold: f64,
    #[serde(default = "default_staking_apy_floor")]
    pub staking_apy_floor: f64,
    #[serde(default = "default_hot_loan_rate_floor")]
    pub hot_loan_rate_floor: f64,
    /// Rows per console table / Telegram report
    #[serde(default = "default_report_top_n")]
    pub report_top_n: usize,
    /// Rows per list in the bot's /analyze reply
    #[serde(default = "default_bot_top_n")]
    pub bot_top_n: usize,
    /// Rows in /best_staking and /hot_loans
    #[serde(default = "default_aux_top_n")]
    pub aux_top_n: usize,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_profit_threshold: default_min_profit_threshold(),
            staking_apy_floor: default_staking_apy_floor(),
            hot_loan_rate_floor: default_hot_loan_rate_floor(),
            report_top_n: default_report_top_n(),
            bot_top_n: default_bot_top_n(),
            aux_top_n: default_aux_top_n(),
        }
    }
}

impl ArbitrageConfig {
    pub fn engine(&self) -> OpportunityEngine {
        OpportunityEngine::new(self.min_profit_threshold)
            .with_floors(self.staking_apy_floor, self.hot_loan_rate_floor)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangesConfig {
    #[serde(default)]
    pub bybit: ExchangeConfig,
    #[serde(default)]
    pub okx: ExchangeConfig,
    #[serde(default)]
    pub binance: ExchangeConfig,
}

/// Per-exchange credentials and transport settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// OKX only
    #[serde(default)]
    pub passphrase: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            api_secret: String::new(),
            passphrase: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &redacted(&self.api_key))
            .field("api_secret", &redacted(&self.api_secret))
            .field("passphrase", &redacted(&self.passphrase))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "[REDACTED]"
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_min_profit_threshold() -> f64 {
    DEFAULT_MIN_PROFIT_THRESHOLD
}

fn default_staking_apy_floor() -> f64 {
    DEFAULT_STAKING_APY_FLOOR
}

fn default_hot_loan_rate_floor() -> f64 {
    DEFAULT_HOT_LOAN_RATE_FLOOR
}

fn default_report_top_n() -> usize {
    20
}

fn default_bot_top_n() -> usize {
    10
}

fn default_aux_top_n() -> usize {
    15
}

fn default_timeout_secs() -> u64 {
    10
}

// =============================================================================
// Loading
// =============================================================================

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse config")
    }

    /// File (if any), then process environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Thresholds must be finite and every row limit at least 1.
    pub fn validate(&self) -> Result<()> {
        let arb = &self.arbitrage;
        for (name, value) in [
            ("min_profit_threshold", arb.min_profit_threshold),
            ("staking_apy_floor", arb.staking_apy_floor),
            ("hot_loan_rate_floor", arb.hot_loan_rate_floor),
        ] {
            if !value.is_finite() {
                bail!("arbitrage.{} must be a finite number, got {}", name, value);
            }
        }
        for (name, value) in [
            ("report_top_n", arb.report_top_n),
            ("bot_top_n", arb.bot_top_n),
            ("aux_top_n", arb.aux_top_n),
        ] {
            if value == 0 {
                bail!("arbitrage.{} must be at least 1", name);
            }
        }
        Ok(())
    }

    /// Overlay values from a key lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.token = v;
        }
        if let Some(v) = get("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = v;
        }
        if let Some(v) = get("TELEGRAM_ENABLED") {
            self.telegram.enabled = parse_flag(&v);
        }
        if let Some(v) = get("MIN_PROFIT_THRESHOLD") {
            self.arbitrage.min_profit_threshold = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid MIN_PROFIT_THRESHOLD: {}", v))?;
            if !self.arbitrage.min_profit_threshold.is_finite() {
                bail!("MIN_PROFIT_THRESHOLD must be finite, got {}", v);
            }
        }

        let sections = [
            ("BYBIT", &mut self.exchanges.bybit),
            ("OKX", &mut self.exchanges.okx),
            ("BINANCE", &mut self.exchanges.binance),
        ];
        for (prefix, exchange) in sections {
            if let Some(v) = get(&format!("{}_ENABLED", prefix)) {
                exchange.enabled = parse_flag(&v);
            }
            if let Some(v) = get(&format!("{}_API_KEY", prefix)) {
                exchange.api_key = v;
            }
            if let Some(v) = get(&format!("{}_API_SECRET", prefix)) {
                exchange.api_secret = v;
            }
            if let Some(v) = get(&format!("{}_PASSPHRASE", prefix)) {
                exchange.passphrase = v;
            }
        }

        Ok(())
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim(), "1" | "true" | "TRUE" | "on" | "ON" | "yes")
}

/// Load `.env` from the working directory (and parents) plus the crate root.
pub fn load_env() {
    let _ = dotenv::dotenv();

    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}

/// Returns a default configuration string for documentation.
pub fn default_config_template() -> &'static str {
    r#"# Carry scanner configuration
#
# Secrets may be left empty here and supplied through the environment
# (TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID, BYBIT_API_KEY, OKX_PASSPHRASE, ...).

[telegram]
token = ""
chat_id = ""
enabled = true
poll_timeout_secs = 30

[arbitrage]
# Minimum net spread (staking APY - loan rate, percentage points)
min_profit_threshold = 0.1
# /best_staking lists products paying more than this
staking_apy_floor = 5.0
# /hot_loans lists loans costing more than this
hot_loan_rate_floor = 15.0
report_top_n = 20
bot_top_n = 10
aux_top_n = 15

[exchanges.bybit]
enabled = true
timeout_secs = 10

[exchanges.okx]
enabled = true
api_key = ""
api_secret = ""
passphrase = ""

[exchanges.binance]
enabled = true
api_key = ""
api_secret = ""
"#
}
