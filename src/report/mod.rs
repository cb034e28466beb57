//! Presentation of engine output: colored console tables and Telegram HTML.
//! Truncation to top-N happens here only; the engine always returns full lists.

pub mod console;
pub mod telegram;

use crate::models::Opportunity;

/// Mean net profit over the first `limit` entries, 0 when empty
pub fn average_net_profit(opportunities: &[Opportunity], limit: usize) -> f64 {
    let top = &opportunities[..opportunities.len().min(limit)];
    if top.is_empty() {
        return 0.0;
    }
    top.iter().map(|o| o.net_profit).sum::<f64>() / top.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::find_intra_opportunities;
    use crate::models::{ExchangeSnapshot, LoanQuote, StakingQuote};

    #[test]
    fn test_average_over_top_n() {
        let snap = ExchangeSnapshot::new("Bybit")
            .with_loan("A", LoanQuote::new(0.0))
            .with_staking("A", StakingQuote::new(10.0))
            .with_loan("B", LoanQuote::new(0.0))
            .with_staking("B", StakingQuote::new(6.0))
            .with_loan("C", LoanQuote::new(0.0))
            .with_staking("C", StakingQuote::new(1.0));
        let opps = find_intra_opportunities(&[snap], 0.1);

        assert_eq!(average_net_profit(&opps, 2), 8.0);
        assert!((average_net_profit(&opps, 20) - 17.0 / 3.0).abs() < 1e-9);
        assert_eq!(average_net_profit(&[], 20), 0.0);
    }
}
