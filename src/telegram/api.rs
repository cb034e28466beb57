//! Minimal Telegram Bot API client over reqwest

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
}

/// Chat ids are numeric or `@channelname`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        match s.trim().parse::<i64>() {
            Ok(id) => ChatId::Id(id),
            Err(_) => ChatId::Username(s.trim().to_string()),
        }
    }
}

#[derive(Clone)]
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl TelegramApi {
    /// `request_timeout` must exceed the getUpdates long-poll timeout.
    pub fn new(token: &str, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", API_BASE, token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Telegram {} request failed", method))?;

        let status = response.status();
        let body: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Telegram {} returned invalid JSON ({})", method, status))?;

        if !body.ok {
            return Err(anyhow!(
                "Telegram {} failed ({}): {}",
                method,
                body.error_code.unwrap_or(status.as_u16() as i64),
                body.description.unwrap_or_default()
            ));
        }
        body.result
            .ok_or_else(|| anyhow!("Telegram {} returned no result", method))
    }

    /// HTML parse mode; returns the sent message id.
    pub async fn send_message(&self, chat_id: &ChatId, text: &str, silent: bool) -> Result<i64> {
        let message: Message = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                    "parse_mode": "HTML",
                    "disable_notification": silent,
                    "disable_web_page_preview": true,
                }),
            )
            .await?;
        Ok(message.message_id)
    }

    pub async fn edit_message_text(&self, chat_id: &ChatId, message_id: i64, text: &str) -> Result<()> {
        // result is the edited Message, or `true` for inline messages
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "text": text,
                    "parse_mode": "HTML",
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_message(&self, chat_id: &ChatId, message_id: i64) -> Result<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                json!({ "chat_id": chat_id, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_id_parsing() {
        assert_eq!(ChatId::from("-100123"), ChatId::Id(-100123));
        assert_eq!(
            ChatId::from("@carry_alerts"),
            ChatId::Username("@carry_alerts".to_string())
        );
        assert_eq!(serde_json::to_value(ChatId::Id(5)).unwrap(), json!(5));
    }

    #[test]
    fn test_decode_updates() {
        let raw = json!({
            "ok": true,
            "result": [
                {"update_id": 10, "message": {
                    "message_id": 1, "chat": {"id": 42, "type": "private"},
                    "from": {"id": 7, "is_bot": false, "first_name": "Ana"},
                    "text": "/analyze"
                }},
                {"update_id": 11, "edited_message": {}}
            ]
        });
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_value(raw).unwrap();
        let updates = parsed.result.unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 42);
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn test_decode_error_response() {
        let raw = json!({"ok": false, "error_code": 401, "description": "Unauthorized"});
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_value(raw).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.description.as_deref(), Some("Unauthorized"));
    }
}
