//! Telegram transport — long-polls the Bot API for updates.
//!
//! Thin adapter: converts messages, commands, and callback queries into
//! core [`Event`]s, hands them to the dialogue engine, and renders
//! [`Reply`] values as messages with inline keyboards. No dialogue logic
//! lives here.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::dialogue::DialogueEngine;
use crate::error::ChannelError;
use crate::event::{Event, UserRef};
use crate::nav::Reply;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// A parsed inbound update: the core event plus transport bookkeeping.
#[derive(Debug)]
struct Inbound {
    event: Event,
    chat_id: String,
    /// Set for callback queries, which must be acknowledged.
    callback_id: Option<String>,
}

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    poll_timeout_secs: u64,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString, poll_timeout_secs: u64) -> Self {
        Self {
            bot_token,
            poll_timeout_secs,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{method}",
            self.bot_token.expose_secret()
        )
    }

    /// Verify the token against `getMe` before serving.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    /// Poll updates forever, routing each through the engine.
    pub async fn run(&self, engine: Arc<DialogueEngine>) {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening for updates...");

        loop {
            let body = serde_json::json!({
                "offset": offset,
                "timeout": self.poll_timeout_secs,
                "allowed_updates": ["message", "callback_query"]
            });

            let resp = match self
                .client
                .post(self.api_url("getUpdates"))
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            let data: serde_json::Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            let Some(results) = data.get("result").and_then(serde_json::Value::as_array) else {
                continue;
            };

            for update in results {
                if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                    offset = uid + 1;
                }

                let Some(inbound) = parse_update(update) else {
                    continue;
                };

                if let Some(ref callback_id) = inbound.callback_id {
                    self.answer_callback(callback_id).await;
                }

                if let Some(reply) = engine.handle(inbound.event).await {
                    if let Err(e) = self.send_reply(&inbound.chat_id, &reply).await {
                        tracing::warn!(chat_id = %inbound.chat_id, "Send failed: {e}");
                    }
                }
            }
        }
    }

    /// Send a reply, long text split at the API limit; the inline keyboard
    /// rides on the last chunk.
    async fn send_reply(&self, chat_id: &str, reply: &Reply) -> Result<(), ChannelError> {
        let chunks = split_message(&reply.text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len() - 1;
        for (n, chunk) in chunks.iter().enumerate() {
            let mut body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            if n == last && !reply.options.is_empty() {
                body["reply_markup"] = serde_json::json!({
                    "inline_keyboard": keyboard_rows(reply),
                });
            }

            let resp = self
                .client
                .post(self.api_url("sendMessage"))
                .json(&body)
                .send()
                .await
                .map_err(|e| ChannelError::SendFailed {
                    name: "telegram".into(),
                    reason: e.to_string(),
                })?;

            if !resp.status().is_success() {
                let status = resp.status();
                let err = resp.text().await.unwrap_or_default();
                return Err(ChannelError::SendFailed {
                    name: "telegram".into(),
                    reason: format!("sendMessage returned {status}: {err}"),
                });
            }
        }
        Ok(())
    }

    /// Acknowledge a callback query so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) {
        let body = serde_json::json!({ "callback_query_id": callback_id });
        if let Err(e) = self
            .client
            .post(self.api_url("answerCallbackQuery"))
            .json(&body)
            .send()
            .await
        {
            tracing::debug!("answerCallbackQuery failed: {e}");
        }
    }
}

/// One button per row, as the menus are laid out.
fn keyboard_rows(reply: &Reply) -> Vec<Vec<serde_json::Value>> {
    reply
        .options
        .iter()
        .map(|o| {
            vec![serde_json::json!({
                "text": o.label,
                "callback_data": o.token,
            })]
        })
        .collect()
}

/// Classify one raw update into a core event. Returns `None` for updates
/// the bot has no use for (edits, stickers, missing fields).
fn parse_update(update: &serde_json::Value) -> Option<Inbound> {
    if let Some(callback) = update.get("callback_query") {
        let token = callback.get("data")?.as_str()?.to_string();
        let user = parse_user(callback.get("from")?)?;
        let chat_id = callback
            .get("message")?
            .get("chat")?
            .get("id")?
            .as_i64()?
            .to_string();
        let callback_id = callback.get("id")?.as_str()?.to_string();
        return Some(Inbound {
            event: Event::ButtonTap { token, user },
            chat_id,
            callback_id: Some(callback_id),
        });
    }

    let message = update.get("message")?;
    let text = message.get("text")?.as_str()?;
    let user = parse_user(message.get("from")?)?;
    let chat_id = message.get("chat")?.get("id")?.as_i64()?.to_string();

    let event = if let Some(command) = text.strip_prefix('/') {
        let name = format!("/{}", command.split_whitespace().next().unwrap_or(""));
        Event::Command { name, user }
    } else {
        Event::FreeText {
            content: text.to_string(),
            user,
        }
    };

    Some(Inbound {
        event,
        chat_id,
        callback_id: None,
    })
}

fn parse_user(from: &serde_json::Value) -> Option<UserRef> {
    let id = from.get("id")?.as_i64()?.to_string();
    let mut user = UserRef::new(id);
    if let Some(username) = from.get("username").and_then(|u| u.as_str()) {
        user = user.with_username(username);
    }
    Some(user)
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        // Back off to a char boundary before slicing (Cyrillic is
        // multi-byte).
        let mut cut = max_len;
        while !remaining.is_char_boundary(cut) {
            cut -= 1;
        }
        let chunk = &remaining[..cut];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(cut);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { cut } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telegram_api_url() {
        let ch = TelegramChannel::new(SecretString::from("123:ABC"), 30);
        assert_eq!(
            ch.api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );
    }

    // ── Update parsing ──────────────────────────────────────────────

    #[test]
    fn parse_text_message() {
        let update = serde_json::json!({
            "update_id": 1,
            "message": {
                "text": "привет",
                "from": {"id": 42, "username": "alice"},
                "chat": {"id": 99}
            }
        });
        let inbound = parse_update(&update).unwrap();
        assert_eq!(inbound.chat_id, "99");
        assert!(inbound.callback_id.is_none());
        match inbound.event {
            Event::FreeText { content, user } => {
                assert_eq!(content, "привет");
                assert_eq!(user.id, "42");
                assert_eq!(user.username.as_deref(), Some("alice"));
            }
            other => panic!("expected FreeText, got {other:?}"),
        }
    }

    #[test]
    fn parse_command_strips_arguments() {
        let update = serde_json::json!({
            "message": {
                "text": "/start now",
                "from": {"id": 42},
                "chat": {"id": 99}
            }
        });
        let inbound = parse_update(&update).unwrap();
        match inbound.event {
            Event::Command { name, user } => {
                assert_eq!(name, "/start");
                assert!(user.username.is_none());
            }
            other => panic!("expected Command, got {other:?}"),
        }
    }

    #[test]
    fn parse_callback_query() {
        let update = serde_json::json!({
            "callback_query": {
                "id": "cb-1",
                "data": "cat_0",
                "from": {"id": 42, "username": "alice"},
                "message": {"chat": {"id": 99}}
            }
        });
        let inbound = parse_update(&update).unwrap();
        assert_eq!(inbound.callback_id.as_deref(), Some("cb-1"));
        assert_eq!(inbound.chat_id, "99");
        match inbound.event {
            Event::ButtonTap { token, .. } => assert_eq!(token, "cat_0"),
            other => panic!("expected ButtonTap, got {other:?}"),
        }
    }

    #[test]
    fn parse_ignores_non_text_updates() {
        assert!(parse_update(&serde_json::json!({"update_id": 1})).is_none());
        assert!(parse_update(&serde_json::json!({
            "message": {"sticker": {}, "from": {"id": 1}, "chat": {"id": 2}}
        }))
        .is_none());
        // Callback with no data is dropped.
        assert!(parse_update(&serde_json::json!({
            "callback_query": {"id": "x", "from": {"id": 1},
                               "message": {"chat": {"id": 2}}}
        }))
        .is_none());
    }

    // ── Keyboard rendering ──────────────────────────────────────────

    #[test]
    fn keyboard_one_button_per_row() {
        let reply = Reply {
            text: "menu".into(),
            options: vec![
                crate::nav::MenuOption {
                    label: "A".into(),
                    token: "cat_0".into(),
                },
                crate::nav::MenuOption {
                    label: "B".into(),
                    token: "cat_1".into(),
                },
            ],
        };
        let rows = keyboard_rows(&reply);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0][0]["callback_data"], "cat_0");
        assert_eq!(rows[1][0]["text"], "B");
    }

    // ── Message splitting ───────────────────────────────────────────

    #[test]
    fn split_message_short() {
        let chunks = split_message("Hello", 4096);
        assert_eq!(chunks, vec!["Hello"]);
    }

    #[test]
    fn split_message_over_limit_on_newline() {
        let msg = format!("{}\n{}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(2000));
        assert_eq!(chunks[1], "b".repeat(3000));
    }

    #[test]
    fn split_message_no_good_split_point() {
        let msg = "a".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }
}
