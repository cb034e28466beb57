//! Telegram integration: Bot API client, push notifier and interactive bot.

pub mod api;
pub mod bot;
pub mod notifier;

pub use api::{ChatId, TelegramApi};
pub use bot::{parse_command, Command, TelegramBot};
pub use notifier::TelegramNotifier;
