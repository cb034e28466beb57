//! Binance margin and staking endpoints

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join_all;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use super::signing::binance_signature;
use super::{build_client, parse_amount, parse_number, parse_symbol, send_json, RateSource};
use crate::config::ExchangeConfig;
use crate::models::{Coin, LoanQuote, LoanTable, StakingQuote, StakingTable};

const BASE_URL: &str = "https://api.binance.com";

/// Assets queried for margin borrow rates
pub const MARGIN_ASSETS: [&str; 10] = [
    "BTC", "ETH", "BNB", "USDT", "USDC", "ADA", "DOT", "LTC", "LINK", "BCH",
];

pub struct BinanceSource {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl BinanceSource {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: BASE_URL.to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    fn request(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        if self.api_key.is_empty() {
            request
        } else {
            request.header("X-MBX-APIKEY", &self.api_key)
        }
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = Url::parse_with_params(&format!("{}{}", self.base_url, path), params)
            .with_context(|| format!("Invalid Binance URL for {}", path))?;
        send_json(self.request(url), &format!("Binance GET {}", path)).await
    }

    /// Appends `timestamp` and the hex signature of the encoded query.
    async fn signed_get(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut params = params.to_vec();
        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));

        let mut url = Url::parse_with_params(&format!("{}{}", self.base_url, path), &params)
            .with_context(|| format!("Invalid Binance URL for {}", path))?;
        let signature = binance_signature(&self.api_secret, url.query().unwrap_or_default())?;
        url.query_pairs_mut().append_pair("signature", &signature);

        send_json(self.request(url), &format!("Binance GET {}", path)).await
    }

    async fn margin_rate(&self, asset: &'static str) -> (&'static str, Result<f64>) {
        let result = self
            .get(
                "/sapi/v1/margin/interestRateHistory",
                &[("asset", asset.to_string())],
            )
            .await
            .and_then(|body| latest_annual_rate(&body));
        (asset, result)
    }

    async fn fetch_staking(&self) -> Result<StakingTable> {
        if self.api_secret.is_empty() {
            return Err(anyhow!("Binance API secret not configured"));
        }
        let body = self
            .signed_get(
                "/sapi/v1/staking/productList",
                &[("product", "STAKING".to_string())],
            )
            .await?;
        Ok(normalize_staking_products(&body))
    }
}

#[async_trait]
impl RateSource for BinanceSource {
    fn name(&self) -> &str {
        "Binance"
    }

    /// Per-asset fetch; each failed asset falls back to its backup rate.
    async fn loan_rates(&self) -> Result<LoanTable> {
        let results = join_all(MARGIN_ASSETS.into_iter().map(|asset| self.margin_rate(asset))).await;

        let mut table = LoanTable::new();
        let mut fallbacks = Vec::new();
        for (asset, result) in results {
            let rate = match result {
                Ok(rate) => rate,
                Err(e) => {
                    debug!(asset, error = %format!("{:#}", e), "Binance margin rate failed");
                    fallbacks.push(asset);
                    backup_loan_rate(asset)
                }
            };
            table.insert(Coin::new(asset), LoanQuote::new(rate));
        }

        if !fallbacks.is_empty() {
            warn!(assets = ?fallbacks, "Binance margin rates replaced by backup rates");
        }
        Ok(table)
    }

    async fn staking_rates(&self) -> Result<StakingTable> {
        match self.fetch_staking().await {
            Ok(table) => Ok(table),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Binance staking unavailable, using sample table");
                Ok(sample_staking_rates())
            }
        }
    }
}

/// First history entry is the latest daily rate (fraction); returns annual percent.
pub(crate) fn latest_annual_rate(body: &Value) -> Result<f64> {
    let latest = body
        .as_array()
        .and_then(|list| list.first())
        .ok_or_else(|| anyhow!("empty interest rate history"))?;
    let daily = latest
        .get("interestRate")
        .and_then(parse_number)
        .ok_or_else(|| anyhow!("missing interestRate"))?;
    Ok(daily * 365.0 * 100.0)
}

pub(crate) fn normalize_staking_products(body: &Value) -> StakingTable {
    let products = body.as_array().map(Vec::as_slice).unwrap_or(&[]);
    products
        .iter()
        .filter_map(|product| {
            let asset = parse_symbol(product, "asset")?;
            let apy = product.get("apr").and_then(parse_number)?;
            let quote =
                StakingQuote::new(apy).with_limits(parse_amount(product, "minPurchaseAmount"), 0.0);
            Some((Coin::new(asset), quote))
        })
        .collect()
}

pub(crate) fn backup_loan_rate(asset: &str) -> f64 {
    match asset {
        "BTC" | "ETH" | "BNB" => 3.5,
        "USDT" | "USDC" | "BUSD" => 5.0,
        _ => 8.0,
    }
}

pub(crate) fn sample_staking_rates() -> StakingTable {
    [
        ("ADA", 4.5),
        ("DOT", 12.0),
        ("ATOM", 15.0),
        ("SOL", 7.5),
        ("ETH", 4.0),
        ("MATIC", 3.0),
        ("BNB", 2.0),
    ]
    .into_iter()
    .map(|(coin, apy)| (Coin::new(coin), StakingQuote::new(apy)))
    .collect()
}
