// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook update payloads and their mapping to [`InboundMessage`].
//!
//! Only the fields the conversation store needs are modelled; everything
//! else in the payload is ignored.

use chrono::{DateTime, Utc};
use parley_core::{ChatKind, InboundMessage};
use serde::Deserialize;

/// One webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<UpdateMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMessage {
    pub message_id: i64,
    /// Unix seconds.
    pub date: i64,
    pub chat: UpdateChat,
    #[serde(default)]
    pub from: Option<UpdateUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub reply_to_message: Option<Box<UpdateMessage>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Parses a raw webhook body.
pub fn parse_update(body: &[u8]) -> Result<Update, serde_json::Error> {
    serde_json::from_slice(body)
}

impl Update {
    /// The carried message as an [`InboundMessage`], or `None` for updates
    /// without one (edits, callbacks, membership changes).
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let msg = self.message?;
        let from = msg.from.as_ref();
        let reply_to_author_is_bot = msg
            .reply_to_message
            .as_ref()
            .and_then(|r| r.from.as_ref())
            .is_some_and(|u| u.is_bot);

        Some(InboundMessage {
            update_id: self.update_id,
            message_id: msg.message_id,
            chat_id: msg.chat.id,
            chat_kind: ChatKind::from_network(&msg.chat.kind),
            chat_title: msg.chat.title.clone(),
            author_user_id: from.map(|u| u.id),
            author_username: from.and_then(|u| u.username.clone()),
            author_first_name: from.and_then(|u| u.first_name.clone()),
            author_last_name: from.and_then(|u| u.last_name.clone()),
            author_is_bot: from.is_some_and(|u| u.is_bot),
            text: msg.text.or(msg.caption).unwrap_or_default(),
            occurred_at: DateTime::<Utc>::from_timestamp(msg.date, 0).unwrap_or_else(Utc::now),
            reply_to_author_is_bot,
        })
    }
}
