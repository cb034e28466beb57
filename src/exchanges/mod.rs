//! Exchange Rate Sources
//!
//! Each venue exposes its loan and staking tables through [`RateSource`].
//! The [`SnapshotCollector`] polls every enabled venue concurrently and
//! freezes the results into [`ExchangeSnapshot`]s for the engine.

pub mod binance;
pub mod bybit;
pub mod okx;
pub mod signing;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{ExchangeConfig, ExchangesConfig};
use crate::models::{ExchangeSnapshot, LoanTable, StakingTable};

pub use binance::BinanceSource;
pub use bybit::BybitSource;
pub use okx::OkxSource;

/// A venue that quotes borrow rates and staking yields
#[async_trait]
pub trait RateSource: Send + Sync {
    fn name(&self) -> &str;

    async fn loan_rates(&self) -> Result<LoanTable>;

    async fn staking_rates(&self) -> Result<StakingTable>;
}

// =============================================================================
// Shared HTTP + normalization helpers
// =============================================================================

pub(crate) fn build_client(config: &ExchangeConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .user_agent(concat!("carrybot/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build exchange HTTP client")
}

/// Send a prepared request and decode the JSON body, failing on non-2xx.
pub(crate) async fn send_json(request: reqwest::RequestBuilder, what: &str) -> Result<Value> {
    let response = request
        .send()
        .await
        .with_context(|| format!("{} request failed", what))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(anyhow!("{} returned {}: {}", what, status, text));
    }

    response
        .json::<Value>()
        .await
        .with_context(|| format!("{} returned invalid JSON", what))
}

/// Numeric field that may arrive as a number or a string, optionally with `%`.
/// Empty, unparseable and non-finite values are rejected.
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s.trim().trim_end_matches('%').trim();
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Optional amount field, 0 when absent or malformed
pub(crate) fn parse_amount(item: &Value, field: &str) -> f64 {
    item.get(field).and_then(parse_number).unwrap_or(0.0)
}

/// Upper-cased, non-empty coin symbol
pub(crate) fn parse_symbol(item: &Value, field: &str) -> Option<String> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
}

// =============================================================================
// Collector
// =============================================================================

/// Per-exchange reachability report for the bot's /status command
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeStatus {
    pub exchange: String,
    pub loan_count: usize,
    pub staking_count: usize,
    pub common_count: usize,
    pub error: Option<String>,
}

impl ExchangeStatus {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Polls a fixed set of sources and produces snapshots in source order
#[derive(Clone)]
pub struct SnapshotCollector {
    sources: Vec<Arc<dyn RateSource>>,
}

impl SnapshotCollector {
    pub fn new(sources: Vec<Arc<dyn RateSource>>) -> Self {
        Self { sources }
    }

    /// Enabled exchanges in fixed order: Bybit, OKX, Binance.
    pub fn from_config(config: &ExchangesConfig) -> Result<Self> {
        let mut sources: Vec<Arc<dyn RateSource>> = Vec::new();

        if config.bybit.enabled {
            sources.push(Arc::new(BybitSource::new(&config.bybit)?));
        }
        if config.okx.enabled {
            sources.push(Arc::new(OkxSource::new(&config.okx)?));
        }
        if config.binance.enabled {
            sources.push(Arc::new(BinanceSource::new(&config.binance)?));
        }

        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        info!(sources = ?names, "Rate sources configured");
        Ok(Self { sources })
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Fetch every source concurrently. A failed side becomes an empty table.
    pub async fn collect(&self) -> Vec<ExchangeSnapshot> {
        let snapshots = join_all(self.sources.iter().map(|s| snapshot_of(s.as_ref()))).await;

        info!(
            exchanges = snapshots.len(),
            loans = snapshots.iter().map(|s| s.loan_rates.len()).sum::<usize>(),
            staking = snapshots.iter().map(|s| s.staking_rates.len()).sum::<usize>(),
            "Collected rate snapshots"
        );
        snapshots
    }

    pub async fn collect_status(&self) -> Vec<ExchangeStatus> {
        join_all(self.sources.iter().map(|s| status_of(s.as_ref()))).await
    }
}

async fn snapshot_of(source: &dyn RateSource) -> ExchangeSnapshot {
    let name = source.name();
    let (loans, staking) = tokio::join!(source.loan_rates(), source.staking_rates());

    let mut snapshot = ExchangeSnapshot::new(name);

    match loans {
        Ok(table) => snapshot.loan_rates = table,
        Err(e) => warn!(exchange = %name, error = %format!("{:#}", e), "Loan rates unavailable"),
    }
    match staking {
        Ok(table) => snapshot.staking_rates = table,
        Err(e) => warn!(exchange = %name, error = %format!("{:#}", e), "Staking rates unavailable"),
    }

    snapshot.loan_rates.retain(|_, q| q.rate.is_finite());
    snapshot.staking_rates.retain(|_, q| q.apy.is_finite());

    debug!(
        exchange = %name,
        loans = snapshot.loan_rates.len(),
        staking = snapshot.staking_rates.len(),
        "Snapshot ready"
    );
    snapshot
}

async fn status_of(source: &dyn RateSource) -> ExchangeStatus {
    let (loans, staking) = tokio::join!(source.loan_rates(), source.staking_rates());

    let mut errors = Vec::new();
    let loans = loans.unwrap_or_else(|e| {
        errors.push(format!("loans: {:#}", e));
        LoanTable::new()
    });
    let staking = staking.unwrap_or_else(|e| {
        errors.push(format!("staking: {:#}", e));
        StakingTable::new()
    });

    let common_count = loans.keys().filter(|c| staking.contains_key(*c)).count();

    ExchangeStatus {
        exchange: source.name().to_string(),
        loan_count: loans.len(),
        staking_count: staking.len(),
        common_count,
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    }
}
