//! OKX account and finance endpoints (signed)

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::signing::{okx_signature, okx_timestamp};
use super::{build_client, parse_amount, parse_number, parse_symbol, send_json, RateSource};
use crate::config::ExchangeConfig;
use crate::models::{Coin, LoanQuote, LoanTable, StakingQuote, StakingTable};

const BASE_URL: &str = "https://www.okx.com";

const STAKING_ENDPOINTS: [&str; 3] = [
    "/api/v5/finance/savings/products",
    "/api/v5/finance/staking-defi/offers",
    "/api/v5/finance/savings/balance",
];

pub struct OkxSource {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    passphrase: String,
}

impl OkxSource {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: BASE_URL.to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            passphrase: config.passphrase.clone(),
        })
    }

    async fn signed_get(&self, request_path: &str) -> Result<Value> {
        let timestamp = okx_timestamp(Utc::now());
        let signature = okx_signature(&self.api_secret, &timestamp, "GET", request_path, "")?;

        let request = self
            .client
            .get(format!("{}{}", self.base_url, request_path))
            .header("OK-ACCESS-KEY", &self.api_key)
            .header("OK-ACCESS-SIGN", signature)
            .header("OK-ACCESS-TIMESTAMP", timestamp)
            .header("OK-ACCESS-PASSPHRASE", &self.passphrase)
            .header("Content-Type", "application/json");

        let body = send_json(request, &format!("OKX GET {}", request_path)).await?;
        check_code(&body)?;
        Ok(body)
    }

    async fn fetch_loan_rates(&self) -> Result<LoanTable> {
        let body = self
            .signed_get("/api/v5/account/interest-rate")
            .await
            .context("OKX interest-rate")?;
        Ok(normalize_interest_rates(&body))
    }
}

#[async_trait]
impl RateSource for OkxSource {
    fn name(&self) -> &str {
        "OKX"
    }

    async fn loan_rates(&self) -> Result<LoanTable> {
        match self.fetch_loan_rates().await {
            Ok(table) => Ok(table),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "OKX loan rates unavailable, using sample table");
                Ok(sample_loan_rates())
            }
        }
    }

    async fn staking_rates(&self) -> Result<StakingTable> {
        let mut last_error = None;
        for endpoint in STAKING_ENDPOINTS {
            match self.signed_get(endpoint).await {
                Ok(body) => {
                    debug!(endpoint, "OKX staking endpoint answered");
                    return Ok(normalize_staking(&body));
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error
            .unwrap_or_else(|| anyhow!("no OKX staking endpoint configured"))
            .context("All OKX staking endpoints failed"))
    }
}

fn check_code(body: &Value) -> Result<()> {
    match body.get("code").and_then(Value::as_str) {
        Some("0") => Ok(()),
        code => Err(anyhow!(
            "OKX API error {:?}: {}",
            code,
            body.get("msg").and_then(Value::as_str).unwrap_or("no message")
        )),
    }
}

fn data_list(body: &Value) -> &[Value] {
    body.get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// `interestRate` is a fraction; the table stores percent.
pub(crate) fn normalize_interest_rates(body: &Value) -> LoanTable {
    data_list(body)
        .iter()
        .filter_map(|item| {
            let coin = parse_symbol(item, "ccy")?;
            let rate = item.get("interestRate").and_then(parse_number)? * 100.0;
            Some((Coin::new(coin), LoanQuote::new(rate)))
        })
        .collect()
}

/// First present of `apy`, `earningRate`, `rate`
pub(crate) fn normalize_staking(body: &Value) -> StakingTable {
    data_list(body)
        .iter()
        .filter_map(|item| {
            let coin = parse_symbol(item, "ccy")?;
            let apy = ["apy", "earningRate", "rate"]
                .iter()
                .filter_map(|field| item.get(*field))
                .find(|v| !v.is_null() && v.as_str() != Some(""))
                .and_then(parse_number)?;
            let quote = StakingQuote::new(apy)
                .with_limits(parse_amount(item, "minAmt"), parse_amount(item, "maxAmt"));
            Some((Coin::new(coin), quote))
        })
        .collect()
}

pub(crate) fn sample_loan_rates() -> LoanTable {
    [("BTC", 3.5), ("ETH", 3.5), ("USDT", 5.0), ("USDC", 5.0)]
        .into_iter()
        .map(|(coin, rate)| (Coin::new(coin), LoanQuote::new(rate)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interest_rate_scaled_to_percent() {
        let body = json!({
            "code": "0",
            "data": [
                {"ccy": "BTC", "interestRate": "0.035"},
                {"ccy": "usdt", "interestRate": "0.05"},
                {"ccy": "ETH", "interestRate": null}
            ]
        });

        let table = normalize_interest_rates(&body);
        assert_eq!(table.len(), 2);
        assert!((table[&Coin::new("BTC")].rate - 3.5).abs() < 1e-9);
        assert!((table[&Coin::new("USDT")].rate - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_staking_field_fallbacks() {
        let body = json!({
            "code": "0",
            "data": [
                {"ccy": "SOL", "apy": "6.5%", "minAmt": "1", "maxAmt": "1000"},
                {"ccy": "DOT", "earningRate": "11"},
                {"ccy": "ATOM", "apy": "", "rate": "14.5"},
                {"ccy": "ADA"}
            ]
        });

        let table = normalize_staking(&body);
        assert_eq!(table.len(), 3);
        let sol = table[&Coin::new("SOL")];
        assert_eq!(sol.apy, 6.5);
        assert_eq!(sol.max_amount, 1000.0);
        assert_eq!(table[&Coin::new("DOT")].apy, 11.0);
        assert_eq!(table[&Coin::new("ATOM")].apy, 14.5);
    }

    #[test]
    fn test_code_check() {
        assert!(check_code(&json!({"code": "0", "data": []})).is_ok());
        let err = check_code(&json!({"code": "50113", "msg": "Invalid Sign"})).unwrap_err();
        assert!(err.to_string().contains("Invalid Sign"));
    }

    #[test]
    fn test_sample_loan_table() {
        let table = sample_loan_rates();
        assert_eq!(table.len(), 4);
        assert_eq!(table[&Coin::new("USDC")].rate, 5.0);
    }
}
