// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, the context pipeline and the adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays in the pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Generation,
    Dispatch,
}

/// Kind of conversation channel.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Other,
}

impl ChatKind {
    /// Maps a messaging-network chat type string onto a [`ChatKind`].
    ///
    /// Supergroups collapse into [`ChatKind::Group`]; channels and anything
    /// unrecognized become [`ChatKind::Other`].
    pub fn from_network(kind: &str) -> Self {
        match kind {
            "private" | "personal_chat" => ChatKind::Private,
            "group" | "supergroup" | "private_group" | "public_supergroup"
            | "private_supergroup" => ChatKind::Group,
            _ => ChatKind::Other,
        }
    }
}

/// A conversation channel, keyed by its external chat id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: i64,
    pub kind: ChatKind,
    pub title: Option<String>,
    /// Counterpart profile, populated for private chats only.
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Set by the store on read.
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the store on read.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Chat {
    pub fn new(chat_id: i64, kind: ChatKind, title: Option<String>) -> Self {
        Self {
            chat_id,
            kind,
            title,
            username: None,
            first_name: None,
            last_name: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// One authored turn in a chat, from a human participant or the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub chat_id: i64,
    pub message_id: i64,
    /// Delivery id from the messaging gateway. Zero for bot replies and imports.
    pub update_id: i64,
    pub author_user_id: Option<i64>,
    pub author_username: Option<String>,
    pub author_first_name: Option<String>,
    pub author_last_name: Option<String>,
    pub text: String,
    /// Authoritative message timestamp. The only ordering exposed to consumers.
    pub occurred_at: DateTime<Utc>,
    pub is_from_bot: bool,
    pub is_addressed_to_bot: bool,
    /// Set by the store on read.
    pub inserted_at: Option<DateTime<Utc>>,
}

/// Sentinel update id for rows that did not arrive through the live gateway.
pub const NO_UPDATE_ID: i64 = 0;

impl Message {
    /// Builds the stored form of an inbound delivery.
    pub fn from_inbound(inbound: &InboundMessage, is_addressed_to_bot: bool) -> Self {
        Self {
            chat_id: inbound.chat_id,
            message_id: inbound.message_id,
            update_id: inbound.update_id,
            author_user_id: inbound.author_user_id,
            author_username: inbound.author_username.clone(),
            author_first_name: inbound.author_first_name.clone(),
            author_last_name: inbound.author_last_name.clone(),
            text: inbound.text.clone(),
            occurred_at: inbound.occurred_at,
            is_from_bot: inbound.author_is_bot,
            is_addressed_to_bot,
            inserted_at: None,
        }
    }

    /// Builds the stored form of a reply the bot has just delivered.
    pub fn bot_reply(chat_id: i64, text: impl Into<String>, receipt: &DispatchReceipt) -> Self {
        Self {
            chat_id,
            message_id: receipt.message_id,
            update_id: NO_UPDATE_ID,
            author_user_id: receipt.author_user_id,
            author_username: receipt.author_username.clone(),
            author_first_name: receipt.author_first_name.clone(),
            author_last_name: None,
            text: text.into(),
            occurred_at: receipt.occurred_at,
            is_from_bot: true,
            is_addressed_to_bot: false,
            inserted_at: None,
        }
    }

    /// Human-readable author label: `@username`, else first/last name, else the user id.
    pub fn author_label(&self) -> String {
        if let Some(username) = self.author_username.as_deref().filter(|u| !u.is_empty()) {
            return format!("@{username}");
        }
        let name = [
            self.author_first_name.as_deref(),
            self.author_last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
        if !name.is_empty() {
            return name;
        }
        match self.author_user_id {
            Some(id) => format!("user{id}"),
            None => "unknown".to_string(),
        }
    }
}

/// A message as parsed and authenticated by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub update_id: i64,
    pub message_id: i64,
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub chat_title: Option<String>,
    pub author_user_id: Option<i64>,
    pub author_username: Option<String>,
    pub author_first_name: Option<String>,
    pub author_last_name: Option<String>,
    #[serde(default)]
    pub author_is_bot: bool,
    pub text: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub reply_to_author_is_bot: bool,
}

impl InboundMessage {
    /// The chat record this delivery implies. Profile fields only for private chats.
    pub fn chat(&self) -> Chat {
        let mut chat = Chat::new(self.chat_id, self.chat_kind, self.chat_title.clone());
        if self.chat_kind == ChatKind::Private {
            chat.username = self.author_username.clone();
            chat.first_name = self.author_first_name.clone();
            chat.last_name = self.author_last_name.clone();
        }
        chat
    }
}

/// Confirmation returned by the reply dispatcher once a reply is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    pub message_id: i64,
    pub author_user_id: Option<i64>,
    pub author_username: Option<String>,
    pub author_first_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Terminal state of one inbound delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnOutcome {
    /// The delivery was already processed.
    Duplicate,
    /// Stored; not directed at the bot.
    StoredNotAddressed,
    /// Stored, answered and the answer delivered.
    StoredAndReplied,
    /// Stored, but retrieval, generation or dispatch failed.
    StoredReplyFailed,
}

/// Speaker of a conversation turn as seen by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One prior message handed to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

impl From<&Message> for ConversationTurn {
    fn from(msg: &Message) -> Self {
        Self {
            role: if msg.is_from_bot {
                TurnRole::Assistant
            } else {
                TurnRole::User
            },
            text: msg.text.clone(),
        }
    }
}

/// Everything the generator needs for one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// System persona, injected from configuration.
    pub persona: String,
    /// Prior turns in the order they should be presented.
    pub turns: Vec<ConversationTurn>,
    /// The message being answered.
    pub current: String,
}
