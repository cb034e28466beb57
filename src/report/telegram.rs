//! Telegram HTML message bodies

use std::fmt::Write;

use crate::arbitrage::{LoanReason, ProfitTier};
use crate::exchanges::ExchangeStatus;
use crate::models::{AnalysisReport, Opportunity, OpportunityKind, RankedLoan, RankedStaking};

use super::average_net_profit;

pub const INTRA_TITLE: &str = "🎯 INTRA-EXCHANGE OPPORTUNITIES";
pub const CROSS_TITLE: &str = "🌐 CROSS-EXCHANGE OPPORTUNITIES";
pub const SUMMARY_TITLE: &str = "🏆 SUMMARY: ALL OPPORTUNITIES";

/// Escape the three characters Telegram's HTML parse mode treats specially.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Top-`limit` block list with a statistics footer.
pub fn format_opportunities(opportunities: &[Opportunity], title: &str, limit: usize) -> String {
    let title = escape_html(title);
    let top = &opportunities[..opportunities.len().min(limit)];
    let Some(best) = top.first() else {
        return format!("❌ <b>{}</b>\n\nNo profitable opportunities found", title);
    };

    let mut msg = format!("<b>{} (TOP-{})</b>\n\n", title, top.len());

    for (i, opp) in top.iter().enumerate() {
        let marker = match opp.kind {
            OpportunityKind::IntraExchange => "📊 INTRA",
            OpportunityKind::CrossExchange => "🌐 CROSS",
        };
        let _ = writeln!(
            msg,
            "<b>{}. {}</b> {} {}",
            i + 1,
            escape_html(opp.coin.as_str()),
            ProfitTier::from_net_profit(opp.net_profit).emoji(),
            marker
        );
        let _ = writeln!(
            msg,
            "   💰 Loan: <code>{:.4}%</code> on <b>{}</b>",
            opp.borrow_rate,
            escape_html(&opp.borrow_exchange)
        );
        let _ = writeln!(
            msg,
            "   📈 Staking: <code>{:.2}%</code> on <b>{}</b>",
            opp.staking_apy,
            escape_html(&opp.staking_exchange)
        );
        let _ = writeln!(
            msg,
            "   🎯 Net profit: <code>{:.2}%</code> - {}\n",
            opp.net_profit,
            escape_html(&opp.profitability_label)
        );
    }

    msg.push_str("<b>📊 STATISTICS:</b>\n");
    let _ = writeln!(msg, "   • Total opportunities: <b>{}</b>", top.len());
    let _ = writeln!(msg, "   • Best profit: <b>{:.2}%</b>", best.net_profit);
    let _ = write!(
        msg,
        "   • Average profit: <b>{:.2}%</b>",
        average_net_profit(top, top.len())
    );
    msg
}

pub fn format_best_staking(entries: &[RankedStaking], limit: usize) -> String {
    if entries.is_empty() {
        return "❌ <b>No high-yield staking products found</b>".to_string();
    }

    let mut msg = String::from("🏆 <b>BEST STAKING ACROSS ALL EXCHANGES</b>\n\n");
    for (i, entry) in entries.iter().take(limit).enumerate() {
        let _ = writeln!(msg, "<b>{}. {}</b>", i + 1, escape_html(entry.coin.as_str()));
        let _ = writeln!(msg, "   📈 APY: <code>{:.2}%</code>", entry.apy);
        let _ = writeln!(msg, "   🏦 Exchange: <b>{}</b>", escape_html(&entry.exchange));
        let _ = writeln!(msg, "   💰 Min amount: <code>{}</code>\n", entry.min_amount);
    }
    msg
}

pub fn format_hot_loans(entries: &[RankedLoan], limit: usize) -> String {
    if entries.is_empty() {
        return "❌ <b>No coins with expensive loans found</b>".to_string();
    }

    let mut msg = String::from("🔥 <b>HOT COINS (EXPENSIVE LOANS)</b>\n\n");
    for (i, entry) in entries.iter().take(limit).enumerate() {
        let _ = writeln!(msg, "<b>{}. {}</b>", i + 1, escape_html(entry.coin.as_str()));
        let _ = writeln!(msg, "   💸 Rate: <code>{:.2}%</code>", entry.rate);
        let _ = writeln!(msg, "   🏦 Exchange: <b>{}</b>", escape_html(&entry.exchange));
        let _ = writeln!(
            msg,
            "   {} Reason: {}\n",
            LoanReason::from_rate(entry.rate).emoji(),
            escape_html(&entry.reason)
        );
    }
    msg
}

/// Counts, best profit and average over the top `avg_window` summary rows
pub fn format_analysis_summary(report: &AnalysisReport, avg_window: usize) -> String {
    let mut msg = String::from("📊 <b>ANALYSIS SUMMARY</b>\n\n");
    let _ = writeln!(msg, "🎯 Intra-exchange opportunities: <b>{}</b>", report.intra.len());
    let _ = writeln!(msg, "🌐 Cross-exchange opportunities: <b>{}</b>", report.cross.len());
    let _ = writeln!(msg, "📈 Total opportunities: <b>{}</b>", report.summary.len());
    let _ = writeln!(
        msg,
        "🏆 Best profit: <b>{:.2}%</b>",
        report.best_profit().unwrap_or(0.0)
    );
    let _ = write!(
        msg,
        "📊 Average profit (top-{}): <b>{:.2}%</b>",
        avg_window,
        average_net_profit(&report.summary, avg_window)
    );
    msg
}

pub fn format_status(statuses: &[ExchangeStatus]) -> String {
    let mut msg = String::from("📊 <b>EXCHANGE STATUS</b>\n\n");
    if statuses.is_empty() {
        msg.push_str("❌ No exchanges enabled");
        return msg;
    }

    for status in statuses {
        let _ = writeln!(msg, "<b>{}</b>", escape_html(&status.exchange));
        let _ = writeln!(msg, "✅ Loans: {} coins", status.loan_count);
        let _ = writeln!(msg, "✅ Staking: {} coins", status.staking_count);
        let _ = writeln!(msg, "📈 Common coins: {}", status.common_count);
        if let Some(error) = &status.error {
            let _ = writeln!(msg, "❌ Error: <code>{}</code>", escape_html(error));
        }
        msg.push('\n');
    }
    msg
}

pub fn format_error(context: &str, error: &anyhow::Error) -> String {
    format!(
        "❌ <b>{}:</b>\n<code>{}</code>",
        escape_html(context),
        escape_html(&format!("{:#}", error))
    )
}

pub fn start_text(first_name: Option<&str>, exchanges: &[&str]) -> String {
    let mut msg = match first_name {
        Some(name) => format!("🤖 Hello, {}!\n\n", escape_html(name)),
        None => "🤖 Hello!\n\n".to_string(),
    };
    msg.push_str("I scan exchanges for loan/staking spreads.\n\n");
    msg.push_str(COMMANDS);
    msg.push_str("\n⚡ <b>Exchanges:</b>\n");
    for exchange in exchanges {
        let _ = writeln!(msg, "• {}", escape_html(exchange));
    }
    msg.push_str("\nNet profit = staking APY - loan rate.");
    msg
}

pub fn help_text() -> String {
    format!(
        "📖 <b>HELP</b>\n\n{}\n\
         <b>How it works:</b>\n\
         1. Collect loan rates from every exchange\n\
         2. Collect staking yields\n\
         3. Match coins available for both\n\
         4. Net profit = staking - loan\n\
         5. Rank the best spreads\n\n\
         <b>Types:</b>\n\
         • 🎯 Intra - borrow and stake on one exchange\n\
         • 🌐 Cross - borrow on one, stake on another\n\n\
         <b>Tiers:</b>\n\
         🚀 &gt;100% | 👑 &gt;20% | 🟢 &gt;15% | 🟡 &gt;10% | 🔵 &gt;2% | 🔴 loss-making",
        COMMANDS
    )
}

pub fn usage_text() -> &'static str {
    "🤖 Use commands to talk to me:\n/analyze - run analysis\n/status - exchange status\n/help - help"
}

pub const ANALYZE_RUNNING: &str =
    "🔄 <b>Running spread analysis...</b>\n⏳ This can take a minute.";

const COMMANDS: &str = "📊 <b>Commands:</b>\n\
/analyze - Run the full spread analysis\n\
/status - Exchange connectivity and coin counts\n\
/best_staking - Best staking yields\n\
/hot_loans - Coins with expensive loans\n\
/help - Usage help\n";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::OpportunityEngine;
    use crate::models::{Coin, ExchangeSnapshot, LoanQuote, StakingQuote};

    fn report() -> AnalysisReport {
        let bybit = ExchangeSnapshot::new("Bybit")
            .with_loan("BTC", LoanQuote::new(2.0))
            .with_staking("BTC", StakingQuote::new(3.5));
        let okx = ExchangeSnapshot::new("OKX")
            .with_loan("BTC", LoanQuote::new(0.5))
            .with_staking("BTC", StakingQuote::new(2.5));
        OpportunityEngine::default().analyze(&[bybit, okx])
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&c"), "a&lt;b&gt;&amp;c");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_format_opportunities_block() {
        let report = report();
        let msg = format_opportunities(&report.cross, CROSS_TITLE, 10);

        assert!(msg.starts_with("<b>🌐 CROSS-EXCHANGE OPPORTUNITIES (TOP-1)</b>"));
        assert!(msg.contains("<b>1. BTC</b> 🔵 🌐 CROSS"));
        assert!(msg.contains("Loan: <code>0.5000%</code> on <b>OKX</b>"));
        assert!(msg.contains("Staking: <code>3.50%</code> on <b>Bybit</b>"));
        assert!(msg.contains("Net profit: <code>3.00%</code> - breakeven"));
        assert!(msg.contains("Best profit: <b>3.00%</b>"));
    }

    #[test]
    fn test_format_opportunities_truncates() {
        let report = report();
        let msg = format_opportunities(&report.summary, SUMMARY_TITLE, 2);
        assert!(msg.contains("(TOP-2)"));
        assert!(!msg.contains("<b>3. "));
    }

    #[test]
    fn test_zero_limit_gives_empty_message() {
        let report = report();
        assert!(!report.intra.is_empty());
        let msg = format_opportunities(&report.intra, INTRA_TITLE, 0);
        assert!(msg.contains("No profitable opportunities found"));
    }

    #[test]
    fn test_empty_list_message() {
        let msg = format_opportunities(&[], INTRA_TITLE, 10);
        assert!(msg.contains("No profitable opportunities found"));
    }

    #[test]
    fn test_summary_counts() {
        let msg = format_analysis_summary(&report(), 20);
        assert!(msg.contains("Intra-exchange opportunities: <b>2</b>"));
        assert!(msg.contains("Cross-exchange opportunities: <b>1</b>"));
        assert!(msg.contains("Total opportunities: <b>3</b>"));
        assert!(msg.contains("Best profit: <b>3.00%</b>"));
    }

    #[test]
    fn test_hot_loans_escape_exchange_name() {
        let entries = vec![RankedLoan {
            coin: Coin::new("XYZ"),
            exchange: "<evil>".to_string(),
            rate: 31.0,
            min_amount: 0.0,
            max_amount: 0.0,
            reason: "high demand".to_string(),
        }];
        let msg = format_hot_loans(&entries, 15);
        assert!(msg.contains("&lt;evil&gt;"));
        assert!(msg.contains("🔥 Reason: high demand"));
    }

    #[test]
    fn test_status_lists_errors() {
        let statuses = vec![ExchangeStatus {
            exchange: "OKX".to_string(),
            loan_count: 4,
            staking_count: 0,
            common_count: 0,
            error: Some("staking: 401 <Unauthorized>".to_string()),
        }];
        let msg = format_status(&statuses);
        assert!(msg.contains("<b>OKX</b>"));
        assert!(msg.contains("Loans: 4 coins"));
        assert!(msg.contains("401 &lt;Unauthorized&gt;"));
    }
}
