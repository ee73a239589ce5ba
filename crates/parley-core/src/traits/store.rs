// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store contract.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ParleyError;
use crate::traits::adapter::Adapter;
use crate::types::{Chat, Message};

/// Durable keyed storage for chats and messages.
///
/// Implementations own the uniqueness guarantees: one chat per `chat_id`,
/// one message per `(chat_id, message_id)`, and one message per nonzero
/// `update_id`. These hold under concurrent writers because they are
/// enforced by the storage engine, not by callers.
///
/// Every sequence returned by a read is ordered by `occurred_at` ascending,
/// except [`ConversationStore::search_relevant_messages`], which is ordered
/// by relevance.
#[async_trait]
pub trait ConversationStore: Adapter {
    /// Inserts the chat if absent. Otherwise refreshes `updated_at` and fills
    /// profile fields that are still empty. `kind` and `title` are never
    /// overwritten.
    async fn upsert_chat(&self, chat: &Chat) -> Result<(), ParleyError>;

    async fn chat_exists(&self, chat_id: i64) -> Result<bool, ParleyError>;

    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>, ParleyError>;

    /// Inserts a message. Fails with [`ParleyError::DuplicateMessage`] when
    /// the `(chat_id, message_id)` pair or the nonzero `update_id` is taken.
    async fn insert_message(&self, message: &Message) -> Result<(), ParleyError>;

    /// Whether a message with this delivery id is stored. Zero never exists.
    async fn update_id_exists(&self, update_id: i64) -> Result<bool, ParleyError>;

    /// All messages with `occurred_at >= now - since`.
    async fn recent_messages(
        &self,
        chat_id: i64,
        since: Duration,
    ) -> Result<Vec<Message>, ParleyError> {
        self.recent_messages_at(chat_id, since, Utc::now()).await
    }

    /// [`ConversationStore::recent_messages`] against a caller-supplied
    /// `now`. A window reaching past the earliest representable instant
    /// covers the whole history.
    async fn recent_messages_at(
        &self,
        chat_id: i64,
        since: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Message>, ParleyError>;

    /// The `limit` most recent messages, returned oldest first.
    async fn last_messages(&self, chat_id: i64, limit: usize)
    -> Result<Vec<Message>, ParleyError>;

    /// Lexical search over messages with `occurred_at < now - exclude_recent`,
    /// ranked by relevance and capped at `limit`.
    async fn search_relevant_messages(
        &self,
        chat_id: i64,
        query: &str,
        limit: usize,
        exclude_recent: Duration,
    ) -> Result<Vec<Message>, ParleyError> {
        self.search_relevant_messages_at(chat_id, query, limit, exclude_recent, Utc::now())
            .await
    }

    /// [`ConversationStore::search_relevant_messages`] against a
    /// caller-supplied `now`. With the same `now` and an equal window it is
    /// disjoint from [`ConversationStore::recent_messages_at`].
    async fn search_relevant_messages_at(
        &self,
        chat_id: i64,
        query: &str,
        limit: usize,
        exclude_recent: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Message>, ParleyError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), ParleyError>;
}
