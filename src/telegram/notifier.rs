//! Push notifications to the configured chat

use anyhow::Result;
use std::time::Duration;
use tracing::debug;

use super::api::{ChatId, TelegramApi};
use crate::config::TelegramConfig;
use crate::models::Opportunity;
use crate::report::telegram::format_opportunities;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends HTML messages to one chat. A disabled notifier accepts and drops everything.
#[derive(Clone)]
pub struct TelegramNotifier {
    inner: Option<(TelegramApi, ChatId)>,
}

impl TelegramNotifier {
    pub fn from_config(config: &TelegramConfig) -> Result<Self> {
        if !config.is_active() {
            debug!("Telegram notifier disabled");
            return Ok(Self::disabled());
        }
        let api = TelegramApi::new(&config.token, SEND_TIMEOUT)?;
        Ok(Self {
            inner: Some((api, ChatId::from(config.chat_id.as_str()))),
        })
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn send_message(&self, text: &str, silent: bool) -> Result<()> {
        let Some((api, chat_id)) = &self.inner else {
            return Ok(());
        };
        api.send_message(chat_id, text, silent).await?;
        debug!(chars = text.len(), silent, "Telegram message sent");
        Ok(())
    }

    pub async fn send_opportunities(
        &self,
        opportunities: &[Opportunity],
        title: &str,
        limit: usize,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.send_message(&format_opportunities(opportunities, title, limit), false)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_config_gives_disabled_notifier() {
        let mut config = TelegramConfig::default();
        config.token = "123:abc".to_string();
        let notifier = TelegramNotifier::from_config(&config).unwrap();
        assert!(!notifier.is_enabled());

        config.chat_id = "42".to_string();
        assert!(TelegramNotifier::from_config(&config).unwrap().is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_send_is_noop() {
        let notifier = TelegramNotifier::disabled();
        notifier.send_message("hello", true).await.unwrap();
        notifier.send_opportunities(&[], "TITLE", 20).await.unwrap();
    }
}
