//! Console tables
//!
//! Net profit is colored by tier with crossterm ANSI styling. Rendering goes
//! to a `String` so the binaries decide where it is written.

use crossterm::style::{style, Color, Stylize};
use std::fmt::Write;

use crate::arbitrage::ProfitTier;
use crate::models::{AnalysisReport, Opportunity};

const RULE_WIDTH: usize = 104;

fn tier_color(tier: ProfitTier) -> Color {
    match tier {
        ProfitTier::SuperProfit | ProfitTier::VeryHigh => Color::Magenta,
        ProfitTier::Excellent | ProfitTier::Good => Color::Green,
        ProfitTier::Low => Color::Yellow,
        ProfitTier::Breakeven => Color::Cyan,
        ProfitTier::LossMaking => Color::Red,
    }
}

fn paint(text: String, color: Color, colored: bool) -> String {
    if colored {
        style(text).with(color).to_string()
    } else {
        text
    }
}

/// One row per opportunity, at most `limit` rows
pub fn render_opportunity_table(
    opportunities: &[Opportunity],
    title: &str,
    limit: usize,
    colored: bool,
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "{}", paint(title.to_string(), Color::Cyan, colored));
    let _ = writeln!(out, "{}", rule);

    if opportunities.is_empty() {
        let _ = writeln!(out, "No opportunities found");
        return out;
    }

    let _ = writeln!(
        out,
        "{:>3}  {:<8} {:<10} {:<10} {:>10} {:>9} {:>10}  {}",
        "#", "Coin", "Borrow", "Stake", "Loan %", "APY %", "Net %", "Label"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    for (i, opp) in opportunities.iter().take(limit).enumerate() {
        let tier = ProfitTier::from_net_profit(opp.net_profit);
        // pad before painting so ANSI codes do not break alignment
        let net = paint(format!("{:>10.2}", opp.net_profit), tier_color(tier), colored);
        let _ = writeln!(
            out,
            "{:>3}  {:<8} {:<10} {:<10} {:>10.4} {:>9.2} {}  {} {}",
            i + 1,
            opp.coin.as_str(),
            opp.borrow_exchange,
            opp.staking_exchange,
            opp.borrow_rate,
            opp.staking_apy,
            net,
            tier.emoji(),
            opp.profitability_label
        );
    }

    if opportunities.len() > limit {
        let _ = writeln!(out, "... {} more not shown", opportunities.len() - limit);
    }
    out
}

pub fn render_final_stats(report: &AnalysisReport, colored: bool) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "{}", paint("FINAL STATISTICS".to_string(), Color::Cyan, colored));
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Intra-exchange opportunities: {}", report.intra.len());
    let _ = writeln!(out, "Cross-exchange opportunities: {}", report.cross.len());
    let _ = writeln!(out, "Total opportunities:          {}", report.summary.len());

    match report.best_profit() {
        Some(best) => {
            let tier = ProfitTier::from_net_profit(best);
            let value = paint(format!("{:.2}%", best), tier_color(tier), colored);
            let _ = writeln!(out, "Best net profit:              {} ({})", value, tier.label());
        }
        None => {
            let _ = writeln!(out, "Best net profit:              n/a");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::OpportunityEngine;
    use crate::models::{ExchangeSnapshot, LoanQuote, StakingQuote};

    fn report() -> AnalysisReport {
        let snap = ExchangeSnapshot::new("Bybit")
            .with_loan("ADA", LoanQuote::new(3.0))
            .with_staking("ADA", StakingQuote::new(4.5))
            .with_loan("DOT", LoanQuote::new(1.0))
            .with_staking("DOT", StakingQuote::new(25.0));
        OpportunityEngine::default().analyze(&[snap])
    }

    #[test]
    fn test_plain_table_rows() {
        let report = report();
        let table = render_opportunity_table(&report.intra, "INTRA", 20, false);

        let rows: Vec<&str> = table.lines().filter(|l| l.contains("Bybit")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("DOT"));
        assert!(rows[0].contains("24.00"));
        assert!(rows[0].contains("excellent"));
        assert!(rows[1].contains("3.0000"));
        assert!(!table.contains('\u{1b}'));
    }

    #[test]
    fn test_colored_output_has_ansi() {
        let report = report();
        let table = render_opportunity_table(&report.intra, "INTRA", 20, true);
        // crossterm honours NO_COLOR globally
        if std::env::var_os("NO_COLOR").is_none() {
            assert!(table.contains('\u{1b}'));
        }
    }

    #[test]
    fn test_limit_and_empty() {
        let report = report();
        let table = render_opportunity_table(&report.intra, "INTRA", 1, false);
        assert!(table.contains("1 more not shown"));

        let empty = render_opportunity_table(&[], "CROSS", 20, false);
        assert!(empty.contains("No opportunities found"));
    }

    #[test]
    fn test_final_stats() {
        let stats = render_final_stats(&report(), false);
        assert!(stats.contains("Total opportunities:          2"));
        assert!(stats.contains("24.00% (excellent)"));

        let empty = render_final_stats(&AnalysisReport::default(), false);
        assert!(empty.contains("n/a"));
    }
}
