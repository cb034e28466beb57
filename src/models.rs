use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Uppercase ticker symbol used as the join key between loan and staking tables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coin(String);

impl Coin {
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self(symbol.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Coin {
    fn from(s: &str) -> Self {
        Coin::new(s)
    }
}

/// Cost of borrowing one coin on one exchange
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanQuote {
    /// Annualized percentage (3.5 means 3.5%/year), never a fraction
    pub rate: f64,
    pub min_amount: f64,
    pub max_amount: f64,
}

impl LoanQuote {
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            min_amount: 0.0,
            max_amount: 0.0,
        }
    }

    pub fn with_limits(mut self, min_amount: f64, max_amount: f64) -> Self {
        self.min_amount = min_amount.max(0.0);
        self.max_amount = max_amount.max(0.0);
        self
    }
}

/// Yield obtainable by staking/saving one coin on one exchange
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StakingQuote {
    /// Annualized percentage
    pub apy: f64,
    pub min_amount: f64,
    pub max_amount: f64,
}

impl StakingQuote {
    pub fn new(apy: f64) -> Self {
        Self {
            apy,
            min_amount: 0.0,
            max_amount: 0.0,
        }
    }

    pub fn with_limits(mut self, min_amount: f64, max_amount: f64) -> Self {
        self.min_amount = min_amount.max(0.0);
        self.max_amount = max_amount.max(0.0);
        self
    }
}

pub type LoanTable = BTreeMap<Coin, LoanQuote>;
pub type StakingTable = BTreeMap<Coin, StakingQuote>;

/// One exchange's fully fetched rate tables for a single analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    pub exchange_name: String,
    pub loan_rates: LoanTable,
    pub staking_rates: StakingTable,
}

impl ExchangeSnapshot {
    pub fn new(exchange_name: impl Into<String>) -> Self {
        Self {
            exchange_name: exchange_name.into(),
            loan_rates: LoanTable::new(),
            staking_rates: StakingTable::new(),
        }
    }

    pub fn with_loan(mut self, coin: &str, quote: LoanQuote) -> Self {
        self.loan_rates.insert(Coin::new(coin), quote);
        self
    }

    pub fn with_staking(mut self, coin: &str, quote: StakingQuote) -> Self {
        self.staking_rates.insert(Coin::new(coin), quote);
        self
    }

    /// Coins quoted in both tables, ascending
    pub fn common_coins(&self) -> impl Iterator<Item = &Coin> {
        self.loan_rates
            .keys()
            .filter(|coin| self.staking_rates.contains_key(*coin))
    }
}

/// Opportunity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    IntraExchange,
    CrossExchange,
}

impl OpportunityKind {
    pub fn as_str(&self) -> &str {
        match self {
            OpportunityKind::IntraExchange => "intra",
            OpportunityKind::CrossExchange => "cross",
        }
    }
}

/// Borrow on one venue, stake on another (or the same) venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub coin: Coin,
    pub borrow_exchange: String,
    pub borrow_rate: f64,
    pub staking_exchange: String,
    pub staking_apy: f64,
    /// `staking_apy - borrow_rate`, unrounded
    pub net_profit: f64,
    pub profitability_label: String,
    pub kind: OpportunityKind,
}

impl Opportunity {
    /// Dedup identity: (coin, borrow exchange, staking exchange)
    pub fn key(&self) -> (&Coin, &str, &str) {
        (
            &self.coin,
            self.borrow_exchange.as_str(),
            self.staking_exchange.as_str(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStaking {
    pub coin: Coin,
    pub exchange: String,
    pub apy: f64,
    pub min_amount: f64,
    pub max_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLoan {
    pub coin: Coin,
    pub exchange: String,
    pub rate: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    pub reason: String,
}

/// Everything the engine produces for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub intra: Vec<Opportunity>,
    pub cross: Vec<Opportunity>,
    pub summary: Vec<Opportunity>,
    pub best_staking: Vec<RankedStaking>,
    pub hot_loans: Vec<RankedLoan>,
}

impl AnalysisReport {
    pub fn best_profit(&self) -> Option<f64> {
        self.summary.first().map(|o| o.net_profit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_is_case_normalized() {
        assert_eq!(Coin::new(" btc "), Coin::new("BTC"));
        assert_eq!(Coin::new("eth").as_str(), "ETH");
    }

    #[test]
    fn test_common_coins_are_ordered_intersection() {
        let snap = ExchangeSnapshot::new("X")
            .with_loan("sol", LoanQuote::new(1.0))
            .with_loan("ADA", LoanQuote::new(1.0))
            .with_loan("BTC", LoanQuote::new(1.0))
            .with_staking("ADA", StakingQuote::new(2.0))
            .with_staking("SOL", StakingQuote::new(2.0))
            .with_staking("DOT", StakingQuote::new(2.0));

        let common: Vec<&str> = snap.common_coins().map(|c| c.as_str()).collect();
        assert_eq!(common, vec!["ADA", "SOL"]);
    }

    #[test]
    fn test_quote_limits_clamped_non_negative() {
        let q = LoanQuote::new(3.0).with_limits(-1.0, 50.0);
        assert_eq!(q.min_amount, 0.0);
        assert_eq!(q.max_amount, 50.0);
    }
}
