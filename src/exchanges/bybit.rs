//! Bybit crypto-loan and Earn endpoints (public, unsigned)

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{build_client, parse_amount, parse_number, parse_symbol, send_json, RateSource};
use crate::config::ExchangeConfig;
use crate::models::{Coin, LoanQuote, LoanTable, StakingQuote, StakingTable};

const BASE_URL: &str = "https://api.bybit.com";

pub struct BybitSource {
    client: Client,
    base_url: String,
}

impl BybitSource {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: BASE_URL.to_string(),
        })
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let body = send_json(self.client.get(&url).query(query), &format!("Bybit GET {}", path))
            .await?;
        check_ret_code(&body)?;
        Ok(body)
    }

    async fn earn_products(&self, category: &str) -> Result<StakingTable> {
        let body = self.get("/v5/earn/product", &[("category", category)]).await?;
        let table = normalize_earn_products(&body, category == "FlexibleSaving");
        debug!(category, products = table.len(), "Bybit earn products");
        Ok(table)
    }
}

#[async_trait]
impl RateSource for BybitSource {
    fn name(&self) -> &str {
        "Bybit"
    }

    async fn loan_rates(&self) -> Result<LoanTable> {
        let body = self
            .get(
                "/v5/crypto-loan-common/loanable-data",
                &[("vipLevel", "VIP0")],
            )
            .await?;
        Ok(normalize_loanable_data(&body))
    }

    async fn staking_rates(&self) -> Result<StakingTable> {
        let (flexible, onchain) = tokio::join!(
            self.earn_products("FlexibleSaving"),
            self.earn_products("OnChain")
        );

        match (flexible, onchain) {
            (Ok(flexible), Ok(onchain)) => Ok(merge_max_apy(flexible, onchain)),
            (Ok(table), Err(e)) | (Err(e), Ok(table)) => {
                debug!(error = %format!("{:#}", e), "Bybit earn category failed");
                Ok(table)
            }
            (Err(e), Err(_)) => Err(e),
        }
    }
}

fn check_ret_code(body: &Value) -> Result<()> {
    match body.get("retCode").and_then(Value::as_i64) {
        Some(0) => Ok(()),
        code => Err(anyhow!(
            "Bybit API error {:?}: {}",
            code,
            body.get("retMsg").and_then(Value::as_str).unwrap_or("no message")
        )),
    }
}

fn result_list(body: &Value) -> &[Value] {
    body.pointer("/result/list")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub(crate) fn normalize_loanable_data(body: &Value) -> LoanTable {
    let mut table = LoanTable::new();
    for item in result_list(body) {
        let Some(currency) = parse_symbol(item, "currency") else {
            continue;
        };
        let Some(rate) = item
            .get("flexibleAnnualizedInterestRate")
            .and_then(parse_number)
        else {
            continue;
        };
        let quote = LoanQuote::new(rate).with_limits(
            parse_amount(item, "minLoanAmount"),
            parse_amount(item, "maxLoanAmount"),
        );
        table.insert(Coin::new(currency), quote);
    }
    table
}

/// Earn product list; duplicates of a coin keep the higher apy.
pub(crate) fn normalize_earn_products(body: &Value, available_only: bool) -> StakingTable {
    let mut table = StakingTable::new();
    for item in result_list(body) {
        if available_only && item.get("status").and_then(Value::as_str) != Some("Available") {
            continue;
        }
        let Some(coin) = parse_symbol(item, "coin") else {
            continue;
        };
        let Some(apy) = item.get("estimateApr").and_then(parse_number) else {
            continue;
        };
        let quote = StakingQuote::new(apy).with_limits(
            parse_amount(item, "minStakeAmount"),
            parse_amount(item, "maxStakeAmount"),
        );
        upsert_max(&mut table, Coin::new(coin), quote);
    }
    table
}

fn upsert_max(table: &mut StakingTable, coin: Coin, quote: StakingQuote) {
    match table.get(&coin) {
        Some(existing) if existing.apy >= quote.apy => {}
        _ => {
            table.insert(coin, quote);
        }
    }
}

/// Flexible first, OnChain replaces only with a strictly higher apy
pub(crate) fn merge_max_apy(flexible: StakingTable, onchain: StakingTable) -> StakingTable {
    let mut merged = flexible;
    for (coin, quote) in onchain {
        upsert_max(&mut merged, coin, quote);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_loanable_data() {
        let body = json!({
            "retCode": 0,
            "result": {"list": [
                {"currency": "btc", "flexibleAnnualizedInterestRate": "2.5", "minLoanAmount": "0.001", "maxLoanAmount": "10"},
                {"currency": "ETH", "flexibleAnnualizedInterestRate": ""},
                {"currency": "", "flexibleAnnualizedInterestRate": "4"},
                {"currency": "USDT", "flexibleAnnualizedInterestRate": 6.1}
            ]}
        });

        let table = normalize_loanable_data(&body);
        assert_eq!(table.len(), 2);
        let btc = table[&Coin::new("BTC")];
        assert_eq!(btc.rate, 2.5);
        assert_eq!(btc.min_amount, 0.001);
        assert_eq!(btc.max_amount, 10.0);
        assert_eq!(table[&Coin::new("USDT")].rate, 6.1);
    }

    #[test]
    fn test_flexible_products_require_available_status() {
        let body = json!({
            "retCode": 0,
            "result": {"list": [
                {"coin": "SOL", "status": "Available", "estimateApr": "5.5%"},
                {"coin": "DOT", "status": "NotAvailable", "estimateApr": "9%"}
            ]}
        });

        let table = normalize_earn_products(&body, true);
        assert_eq!(table.len(), 1);
        assert_eq!(table[&Coin::new("SOL")].apy, 5.5);
    }

    #[test]
    fn test_onchain_duplicates_keep_max() {
        let body = json!({
            "retCode": 0,
            "result": {"list": [
                {"coin": "ETH", "estimateApr": "3.1%"},
                {"coin": "ETH", "estimateApr": "4.2%"},
                {"coin": "ETH", "estimateApr": "2.0%"}
            ]}
        });

        let table = normalize_earn_products(&body, false);
        assert_eq!(table[&Coin::new("ETH")].apy, 4.2);
    }

    #[test]
    fn test_merge_prefers_higher_apy() {
        let mut flexible = StakingTable::new();
        flexible.insert(Coin::new("ETH"), StakingQuote::new(3.0));
        flexible.insert(Coin::new("USDT"), StakingQuote::new(8.0));
        let mut onchain = StakingTable::new();
        onchain.insert(Coin::new("ETH"), StakingQuote::new(4.0));
        onchain.insert(Coin::new("USDT"), StakingQuote::new(7.0));
        onchain.insert(Coin::new("TON"), StakingQuote::new(2.0));

        let merged = merge_max_apy(flexible, onchain);
        assert_eq!(merged[&Coin::new("ETH")].apy, 4.0);
        assert_eq!(merged[&Coin::new("USDT")].apy, 8.0);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_ret_code_error() {
        let body = json!({"retCode": 10001, "retMsg": "params error"});
        let err = check_ret_code(&body).unwrap_err();
        assert!(err.to_string().contains("params error"));
        assert!(check_ret_code(&json!({"retCode": 0})).is_ok());
    }
}
