//! Interactive bot
//!
//! Long-polls `getUpdates` and answers commands. Every command that polls
//! exchanges (`/analyze`, `/status`, `/best_staking`, `/hot_loans`) runs as a
//! spawned task so the update loop keeps going while exchanges are queried.

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::api::{ChatId, Message, TelegramApi};
use crate::config::TelegramConfig;
use crate::report::telegram::{
    format_analysis_summary, format_best_staking, format_error, format_hot_loans,
    format_opportunities, format_status, help_text, start_text, usage_text, ANALYZE_RUNNING,
    CROSS_TITLE, INTRA_TITLE,
};
use crate::scanner::Scanner;

const TRANSPORT_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Analyze,
    Status,
    Help,
    BestStaking,
    HotLoans,
    Unknown(String),
}

/// `None` for plain text. Accepts `/cmd@botname` and trailing arguments.
pub fn parse_command(text: &str) -> Option<Command> {
    let first = text.trim().split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name).to_lowercase();

    Some(match name.as_str() {
        "start" => Command::Start,
        "analyze" => Command::Analyze,
        "status" => Command::Status,
        "help" => Command::Help,
        "best_staking" => Command::BestStaking,
        "hot_loans" => Command::HotLoans,
        _ => Command::Unknown(name),
    })
}

pub struct TelegramBot {
    api: TelegramApi,
    scanner: Arc<Scanner>,
    poll_timeout_secs: u64,
}

impl TelegramBot {
    pub fn new(config: &TelegramConfig, scanner: Arc<Scanner>) -> Result<Self> {
        if config.token.is_empty() {
            bail!("Telegram bot token not configured (set TELEGRAM_BOT_TOKEN)");
        }
        let poll_timeout_secs = config.poll_timeout_secs;
        let api = TelegramApi::new(
            &config.token,
            Duration::from_secs(poll_timeout_secs + 10),
        )?;
        Ok(Self {
            api,
            scanner,
            poll_timeout_secs,
        })
    }

    /// Poll forever.
    pub async fn run(&self) -> Result<()> {
        info!(exchanges = ?self.scanner.exchange_names(), "🤖 Telegram bot polling");
        let mut offset = 0i64;

        loop {
            let updates = match self.api.get_updates(offset, self.poll_timeout_secs).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %format!("{:#}", e), "getUpdates failed, backing off");
                    tokio::time::sleep(TRANSPORT_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                if let Err(e) = self.handle_message(&message).await {
                    error!(
                        chat_id = message.chat.id,
                        error = %format!("{:#}", e),
                        "Handler failed"
                    );
                }
            }
        }
    }

    async fn handle_message(&self, message: &Message) -> Result<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let chat_id = ChatId::from(message.chat.id);
        let command = parse_command(text);
        debug!(chat_id = message.chat.id, ?command, "Incoming message");

        match command {
            Some(Command::Start) => {
                let first_name = message.from.as_ref().map(|u| u.first_name.as_str());
                let text = start_text(first_name, &self.scanner.exchange_names());
                self.reply(&chat_id, &text).await
            }
            Some(Command::Help) => self.reply(&chat_id, &help_text()).await,
            Some(Command::Status) => {
                self.spawn_lookup(chat_id, Lookup::Status);
                Ok(())
            }
            Some(Command::Analyze) => self.start_analysis(chat_id).await,
            Some(Command::BestStaking) => {
                self.reply(&chat_id, "🔄 <b>Collecting staking yields...</b>")
                    .await?;
                self.spawn_lookup(chat_id, Lookup::BestStaking);
                Ok(())
            }
            Some(Command::HotLoans) => {
                self.reply(&chat_id, "🔄 <b>Looking for expensive loans...</b>")
                    .await?;
                self.spawn_lookup(chat_id, Lookup::HotLoans);
                Ok(())
            }
            Some(Command::Unknown(_)) | None => self.reply(&chat_id, usage_text()).await,
        }
    }

    async fn reply(&self, chat_id: &ChatId, text: &str) -> Result<()> {
        self.api.send_message(chat_id, text, false).await.map(|_| ())
    }

    /// Exchange polling runs off the update loop; the reply follows when it finishes.
    fn spawn_lookup(&self, chat_id: ChatId, lookup: Lookup) {
        let api = self.api.clone();
        let scanner = Arc::clone(&self.scanner);
        tokio::spawn(async move {
            let text = lookup_reply(&scanner, lookup).await;
            if let Err(e) = api.send_message(&chat_id, &text, false).await {
                error!(error = %format!("{:#}", e), ?lookup, "Failed to deliver reply");
            }
        });
    }

    async fn start_analysis(&self, chat_id: ChatId) -> Result<()> {
        let status_id = self.api.send_message(&chat_id, ANALYZE_RUNNING, false).await?;

        let api = self.api.clone();
        let scanner = Arc::clone(&self.scanner);
        tokio::spawn(async move {
            if let Err(e) = run_analysis(&api, &scanner, &chat_id, status_id).await {
                error!(error = %format!("{:#}", e), "Failed to deliver analysis");
            }
        });
        Ok(())
    }
}

/// Commands answered with a single message after polling every exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Status,
    BestStaking,
    HotLoans,
}

pub async fn lookup_reply(scanner: &Scanner, lookup: Lookup) -> String {
    let limit = scanner.limits().aux_top_n;
    match lookup {
        Lookup::Status => format_status(&scanner.status().await),
        Lookup::BestStaking => match scanner.analyze().await {
            Ok(report) => format_best_staking(&report.best_staking, limit),
            Err(e) => format_error("Staking lookup failed", &e),
        },
        Lookup::HotLoans => match scanner.analyze().await {
            Ok(report) => format_hot_loans(&report.hot_loans, limit),
            Err(e) => format_error("Loan lookup failed", &e),
        },
    }
}

async fn run_analysis(
    api: &TelegramApi,
    scanner: &Scanner,
    chat_id: &ChatId,
    status_id: i64,
) -> Result<()> {
    let report = match scanner.analyze().await {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Bot analysis failed");
            return api
                .edit_message_text(chat_id, status_id, &format_error("Analysis failed", &e))
                .await;
        }
    };

    if let Err(e) = api.delete_message(chat_id, status_id).await {
        debug!(error = %format!("{:#}", e), "Could not delete status message");
    }

    let top = scanner.limits().bot_top_n;
    if !report.intra.is_empty() {
        api.send_message(chat_id, &format_opportunities(&report.intra, INTRA_TITLE, top), false)
            .await?;
    }
    if !report.cross.is_empty() {
        api.send_message(chat_id, &format_opportunities(&report.cross, CROSS_TITLE, top), false)
            .await?;
    }
    api.send_message(
        chat_id,
        &format_analysis_summary(&report, scanner.limits().report_top_n),
        false,
    )
    .await?;

    info!(total = report.summary.len(), "Bot analysis delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::testing::StaticSource;
    use crate::exchanges::{RateSource, SnapshotCollector};

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/analyze"), Some(Command::Analyze));
        assert_eq!(parse_command("  /status  "), Some(Command::Status));
        assert_eq!(parse_command("/HELP"), Some(Command::Help));
        assert_eq!(parse_command("/best_staking"), Some(Command::BestStaking));
        assert_eq!(parse_command("/hot_loans now"), Some(Command::HotLoans));
    }

    #[test]
    fn test_parse_addressed_command() {
        assert_eq!(parse_command("/analyze@carry_bot"), Some(Command::Analyze));
    }

    #[test]
    fn test_parse_plain_text_and_unknown() {
        assert_eq!(parse_command("hello there"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(
            parse_command("/moon"),
            Some(Command::Unknown("moon".to_string()))
        );
    }

    fn scanner(sources: Vec<StaticSource>) -> Scanner {
        Scanner::new(
            SnapshotCollector::new(
                sources
                    .into_iter()
                    .map(|s| Arc::new(s) as Arc<dyn RateSource>)
                    .collect(),
            ),
            crate::telegram::TelegramNotifier::disabled(),
            crate::config::ArbitrageConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_lookup_replies() {
        let scanner = scanner(vec![StaticSource::new(
            "Bybit",
            &[("WIF", 31.0), ("BTC", 2.0)],
            &[("DOT", 12.0), ("BTC", 3.0)],
        )]);

        let status = lookup_reply(&scanner, Lookup::Status).await;
        assert!(status.contains("<b>Bybit</b>"));
        assert!(status.contains("Loans: 2 coins"));

        let staking = lookup_reply(&scanner, Lookup::BestStaking).await;
        assert!(staking.contains("<b>1. DOT</b>"));

        let loans = lookup_reply(&scanner, Lookup::HotLoans).await;
        assert!(loans.contains("<b>1. WIF</b>"));
    }

    #[tokio::test]
    async fn test_lookup_reply_reports_errors() {
        let scanner = scanner(vec![]);
        let reply = lookup_reply(&scanner, Lookup::BestStaking).await;
        assert!(reply.contains("Staking lookup failed"));
    }

    #[test]
    fn test_bot_requires_token() {
        let scanner = Arc::new(Scanner::new(
            crate::exchanges::SnapshotCollector::new(Vec::new()),
            crate::telegram::TelegramNotifier::disabled(),
            crate::config::ArbitrageConfig::default(),
        ));
        assert!(TelegramBot::new(&TelegramConfig::default(), scanner).is_err());
    }
}
