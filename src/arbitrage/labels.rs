//! Profitability and loan-demand tiers
//! Fixed boundary tables, strict `>` comparisons, highest threshold checked first.

use serde::{Deserialize, Serialize};

/// Net-profit tier of an opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitTier {
    SuperProfit,
    VeryHigh,
    Excellent,
    Good,
    Low,
    Breakeven,
    LossMaking,
}

impl ProfitTier {
    pub fn from_net_profit(net_profit: f64) -> Self {
        if net_profit > 100.0 {
            ProfitTier::SuperProfit
        } else if net_profit > 50.0 {
            ProfitTier::VeryHigh
        } else if net_profit > 20.0 {
            ProfitTier::Excellent
        } else if net_profit > 15.0 {
            ProfitTier::Good
        } else if net_profit > 10.0 {
            ProfitTier::Low
        } else if net_profit > 2.0 {
            ProfitTier::Breakeven
        } else {
            ProfitTier::LossMaking
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfitTier::SuperProfit => "super profit",
            ProfitTier::VeryHigh => "very high",
            ProfitTier::Excellent => "excellent",
            ProfitTier::Good => "good",
            ProfitTier::Low => "low",
            ProfitTier::Breakeven => "breakeven",
            ProfitTier::LossMaking => "loss-making",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ProfitTier::SuperProfit => "🚀",
            ProfitTier::VeryHigh | ProfitTier::Excellent => "👑",
            ProfitTier::Good => "🟢",
            ProfitTier::Low => "🟡",
            ProfitTier::Breakeven => "🔵",
            ProfitTier::LossMaking => "🔴",
        }
    }
}

/// Human-readable tier label for a net-profit percentage
pub fn profitability_label(net_profit: f64) -> &'static str {
    ProfitTier::from_net_profit(net_profit).label()
}

/// Why a loan rate is elevated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanReason {
    VeryHighDemand,
    HighDemand,
    ElevatedDemand,
    ActiveTrading,
    StandardRate,
}

impl LoanReason {
    pub fn from_rate(rate: f64) -> Self {
        if rate > 50.0 {
            LoanReason::VeryHighDemand
        } else if rate > 30.0 {
            LoanReason::HighDemand
        } else if rate > 20.0 {
            LoanReason::ElevatedDemand
        } else if rate > 15.0 {
            LoanReason::ActiveTrading
        } else {
            LoanReason::StandardRate
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanReason::VeryHighDemand => "very high demand",
            LoanReason::HighDemand => "high demand",
            LoanReason::ElevatedDemand => "elevated demand",
            LoanReason::ActiveTrading => "active trading",
            LoanReason::StandardRate => "standard rate",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LoanReason::VeryHighDemand => "🚀",
            LoanReason::HighDemand => "🔥",
            LoanReason::ElevatedDemand => "⚡",
            LoanReason::ActiveTrading => "📈",
            LoanReason::StandardRate => "📊",
        }
    }
}

pub fn loan_reason(rate: f64) -> &'static str {
    LoanReason::from_rate(rate).label()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profit_label_boundaries() {
        assert_eq!(profitability_label(100.01), "super profit");
        assert_eq!(profitability_label(100.0), "very high");
        assert_eq!(profitability_label(50.01), "very high");
        assert_eq!(profitability_label(50.0), "excellent");
        assert_eq!(profitability_label(20.0), "good");
        assert_eq!(profitability_label(15.0), "low");
        assert_eq!(profitability_label(10.0), "breakeven");
        assert_eq!(profitability_label(2.01), "breakeven");
        assert_eq!(profitability_label(2.0), "loss-making");
        assert_eq!(profitability_label(-7.5), "loss-making");
    }

    #[test]
    fn test_loan_reason_tiers() {
        assert_eq!(loan_reason(50.5), "very high demand");
        assert_eq!(loan_reason(50.0), "high demand");
        assert_eq!(loan_reason(30.0), "elevated demand");
        assert_eq!(loan_reason(20.0), "active trading");
        assert_eq!(loan_reason(15.0), "standard rate");
    }

    #[test]
    fn test_tier_emoji() {
        assert_eq!(ProfitTier::from_net_profit(16.0).emoji(), "🟢");
        assert_eq!(LoanReason::from_rate(31.0).emoji(), "🔥");
    }
}
