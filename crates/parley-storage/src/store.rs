// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`ConversationStore`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_config::model::StorageConfig;
use parley_core::{
    Adapter, AdapterType, Chat, ConversationStore, HealthStatus, Message, ParleyError,
};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed conversation store.
///
/// The file is opened lazily by [`SqliteStore::initialize`]; every other
/// operation fails with a storage error until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wraps an already opened database, e.g. an in-memory one.
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
                wal_mode: false,
                busy_timeout_ms: 0,
            },
            db: OnceCell::from(db),
        }
    }

    /// Opens the database at the configured path and runs migrations.
    pub async fn initialize(&self) -> Result<(), ParleyError> {
        let db = Database::open(&self.config).await?;
        self.db.set(db).map_err(|_| ParleyError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "conversation store initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, ParleyError> {
        self.db.get().ok_or_else(|| ParleyError::Storage {
            source: "store not initialized, call initialize() first".into(),
        })
    }
}

#[async_trait]
impl Adapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let ping = db
            .connection()
            .call(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await;
        Ok(match ping {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn upsert_chat(&self, chat: &Chat) -> Result<(), ParleyError> {
        queries::chats::upsert_chat(self.db()?, chat).await
    }

    async fn chat_exists(&self, chat_id: i64) -> Result<bool, ParleyError> {
        queries::chats::chat_exists(self.db()?, chat_id).await
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>, ParleyError> {
        queries::chats::get_chat(self.db()?, chat_id).await
    }

    async fn insert_message(&self, message: &Message) -> Result<(), ParleyError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn update_id_exists(&self, update_id: i64) -> Result<bool, ParleyError> {
        queries::messages::update_id_exists(self.db()?, update_id).await
    }

    async fn recent_messages_at(
        &self,
        chat_id: i64,
        since: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Message>, ParleyError> {
        queries::messages::recent_messages(self.db()?, chat_id, since, now).await
    }

    async fn last_messages(
        &self,
        chat_id: i64,
        limit: usize,
    ) -> Result<Vec<Message>, ParleyError> {
        queries::messages::last_messages(self.db()?, chat_id, limit).await
    }

    async fn search_relevant_messages_at(
        &self,
        chat_id: i64,
        query: &str,
        limit: usize,
        exclude_recent: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Message>, ParleyError> {
        queries::messages::search_relevant_messages(
            self.db()?,
            chat_id,
            query,
            limit,
            exclude_recent,
            now,
        )
        .await
    }

    async fn close(&self) -> Result<(), ParleyError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
