// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`ConversationStore`] wrapper that injects faults per operation.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_core::{
    Adapter, AdapterType, Chat, ConversationStore, HealthStatus, Message, ParleyError,
};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreFault {
    UpdateIdExists,
    UpsertChat,
    /// Inserts of inbound (non-bot) messages.
    InsertInbound,
    /// Inserts of the bot's own replies.
    InsertReply,
    RecentMessages,
    LastMessages,
    Search,
}

/// Delegates to an inner store unless a fault is armed for the operation.
pub struct FailingStore {
    inner: Arc<dyn ConversationStore>,
    faults: RwLock<HashSet<StoreFault>>,
}

impl FailingStore {
    pub fn new(inner: Arc<dyn ConversationStore>) -> Self {
        Self {
            inner,
            faults: RwLock::new(HashSet::new()),
        }
    }

    pub fn inner(&self) -> &Arc<dyn ConversationStore> {
        &self.inner
    }

    pub fn arm(&self, fault: StoreFault) {
        if let Ok(mut faults) = self.faults.write() {
            faults.insert(fault);
        }
    }

    pub fn disarm(&self, fault: StoreFault) {
        if let Ok(mut faults) = self.faults.write() {
            faults.remove(&fault);
        }
    }

    fn check(&self, fault: StoreFault) -> Result<(), ParleyError> {
        let armed = self
            .faults
            .read()
            .map(|faults| faults.contains(&fault))
            .unwrap_or(false);
        if armed {
            return Err(ParleyError::Storage {
                source: format!("injected fault: {fault:?}").into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Adapter for FailingStore {
    fn name(&self) -> &str {
        "failing-store"
    }

    fn version(&self) -> semver::Version {
        self.inner.version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        self.inner.health_check().await
    }
}

#[async_trait]
impl ConversationStore for FailingStore {
    async fn upsert_chat(&self, chat: &Chat) -> Result<(), ParleyError> {
        self.check(StoreFault::UpsertChat)?;
        self.inner.upsert_chat(chat).await
    }

    async fn chat_exists(&self, chat_id: i64) -> Result<bool, ParleyError> {
        self.inner.chat_exists(chat_id).await
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>, ParleyError> {
        self.inner.get_chat(chat_id).await
    }

    async fn insert_message(&self, message: &Message) -> Result<(), ParleyError> {
        if message.is_from_bot {
            self.check(StoreFault::InsertReply)?;
        } else {
            self.check(StoreFault::InsertInbound)?;
        }
        self.inner.insert_message(message).await
    }

    async fn update_id_exists(&self, update_id: i64) -> Result<bool, ParleyError> {
        self.check(StoreFault::UpdateIdExists)?;
        self.inner.update_id_exists(update_id).await
    }

    async fn recent_messages_at(
        &self,
        chat_id: i64,
        since: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Message>, ParleyError> {
        self.check(StoreFault::RecentMessages)?;
        self.inner.recent_messages_at(chat_id, since, now).await
    }

    async fn last_messages(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<Message>, ParleyError> {
        self.check(StoreFault::LastMessages)?;
        self.inner.last_messages(chat_id, limit).await
    }

    async fn search_relevant_messages_at(
        &self,
        chat_id: i64,
        query: &str,
        limit: usize,
        exclude_recent: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Message>, ParleyError> {
        self.check(StoreFault::Search)?;
        self.inner
            .search_relevant_messages_at(chat_id, query, limit, exclude_recent, now)
            .await
    }

    async fn close(&self) -> Result<(), ParleyError> {
        self.inner.close().await
    }
}
