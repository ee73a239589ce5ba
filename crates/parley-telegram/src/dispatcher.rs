// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply delivery through the Bot API `sendMessage` method.

use async_trait::async_trait;
use chrono::Utc;
use parley_config::model::TelegramConfig;
use parley_core::{
    Adapter, AdapterType, DispatchReceipt, HealthStatus, ParleyError, ReplyDispatcher,
};
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ReplyParameters};
use tracing::{debug, info, warn};

/// Bot API limit on message length, in characters.
const MAX_MESSAGE_CHARS: usize = 4096;

/// [`ReplyDispatcher`] over the Telegram Bot API.
pub struct TelegramDispatcher {
    bot: Bot,
}

impl TelegramDispatcher {
    /// Requires `telegram.bot_token`.
    pub fn new(config: &TelegramConfig) -> Result<Self, ParleyError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            ParleyError::Config("telegram.bot_token is required for reply dispatch".into())
        })?;
        if token.is_empty() {
            return Err(ParleyError::Config("telegram.bot_token cannot be empty".into()));
        }

        let mut bot = Bot::new(token);
        if let Some(api_url) = &config.api_url {
            let url = reqwest::Url::parse(api_url).map_err(|e| {
                ParleyError::Config(format!("invalid telegram.api_url `{api_url}`: {e}"))
            })?;
            bot = bot.set_api_url(url);
        }
        Ok(Self { bot })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl Adapter for TelegramDispatcher {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dispatch
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("Telegram bot unreachable: {e}"))),
        }
    }
}

#[async_trait]
impl ReplyDispatcher for TelegramDispatcher {
    /// Sends `text` as a reply to `reply_to`. Text over the length limit
    /// goes out as several messages; the receipt is for the first one.
    /// Once the first message is delivered a later failure only truncates
    /// the reply.
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: i64,
    ) -> Result<DispatchReceipt, ParleyError> {
        let reply_to = i32::try_from(reply_to).map_err(|_| ParleyError::Dispatch {
            message: format!("message id {reply_to} out of range for reply"),
            source: None,
        })?;

        let chunks = split_message(text, MAX_MESSAGE_CHARS);
        let total = chunks.len();
        let mut receipt: Option<DispatchReceipt> = None;
        for (index, chunk) in chunks.into_iter().enumerate() {
            let mut request = self.bot.send_message(ChatId(chat_id), chunk);
            if receipt.is_none() {
                request = request.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
            }
            let sent = match request.await {
                Ok(sent) => sent,
                Err(e) => match &receipt {
                    // The user already has the first part; it must still be recorded.
                    Some(first) => {
                        warn!(
                            chat_id,
                            message_id = first.message_id,
                            chunk = index + 1,
                            of = total,
                            error = %e,
                            "reply truncated, remaining chunks not sent"
                        );
                        break;
                    }
                    None => {
                        return Err(ParleyError::Dispatch {
                            message: format!("failed to send message: {e}"),
                            source: Some(Box::new(e)),
                        });
                    }
                },
            };
            debug!(chat_id, message_id = sent.id.0, "message chunk sent");
            receipt.get_or_insert_with(|| receipt_for(&sent));
        }

        let receipt = receipt.ok_or_else(|| ParleyError::Dispatch {
            message: "refusing to send an empty reply".into(),
            source: None,
        })?;
        info!(chat_id, message_id = receipt.message_id, "reply sent");
        Ok(receipt)
    }
}

fn receipt_for(sent: &Message) -> DispatchReceipt {
    let author = sent.from.as_ref();
    DispatchReceipt {
        message_id: i64::from(sent.id.0),
        author_user_id: author.and_then(|u| i64::try_from(u.id.0).ok()),
        author_username: author.and_then(|u| u.username.clone()),
        author_first_name: author.map(|u| u.first_name.clone()),
        occurred_at: if sent.date.timestamp() > 0 {
            sent.date
        } else {
            Utc::now()
        },
    }
}

/// Splits `text` into chunks of at most `max_chars` characters, preferring
/// paragraph breaks, then line breaks, then spaces. Blank chunks are dropped.
pub fn split_message(text: &str, max_chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let (head, tail) = split_at_boundary(rest, max_chars);
        let head = head.trim_end();
        if !head.is_empty() {
            chunks.push(head);
        }
        rest = tail.trim_start();
    }
    chunks
}

fn split_at_boundary(text: &str, max_chars: usize) -> (&str, &str) {
    let Some((limit, _)) = text.char_indices().nth(max_chars) else {
        return (text, "");
    };
    let region = &text[..limit];

    if let Some(pos) = region.rfind("\n\n").filter(|&p| p > 0) {
        return (&text[..pos], &text[pos + 2..]);
    }
    if let Some(pos) = region.rfind('\n').filter(|&p| p > 0) {
        return (&text[..pos], &text[pos + 1..]);
    }
    if let Some(pos) = region.rfind(' ').filter(|&p| p > 0) {
        return (&text[..pos], &text[pos + 1..]);
    }
    (region, &text[limit..])
}
