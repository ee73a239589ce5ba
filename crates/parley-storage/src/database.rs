// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection management: PRAGMA setup, WAL mode and migrations.
//!
//! `Database` wraps one `tokio_rusqlite::Connection`, whose background thread
//! serializes every statement. All queries go through [`Database::connection`];
//! do not open a second connection for writes.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use parley_config::model::StorageConfig;
use parley_core::ParleyError;
use tracing::debug;

use crate::migrations;

/// Handle to the conversation database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the file named by `config`, applies
    /// PRAGMAs and runs pending migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, ParleyError> {
        let path = Path::new(&config.database_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ParleyError::storage)?;
        }
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(ParleyError::storage)?;
        let db = Self { conn };
        db.prepare(config.wal_mode, Duration::from_millis(config.busy_timeout_ms))
            .await?;
        debug!(path = %config.database_path, wal = config.wal_mode, "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database with the full schema.
    pub async fn open_in_memory() -> Result<Self, ParleyError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(ParleyError::storage)?;
        let db = Self { conn };
        db.prepare(false, Duration::from_millis(0)).await?;
        Ok(db)
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    async fn prepare(&self, wal_mode: bool, busy_timeout: Duration) -> Result<(), ParleyError> {
        self.conn
            .call(move |conn| -> Result<(), ParleyError> {
                if wal_mode {
                    let mode: String = conn
                        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                        .map_err(ParleyError::storage)?;
                    debug!(journal_mode = %mode, "journal mode set");
                    conn.pragma_update(None, "synchronous", "NORMAL")
                        .map_err(ParleyError::storage)?;
                }
                if !busy_timeout.is_zero() {
                    conn.busy_timeout(busy_timeout).map_err(ParleyError::storage)?;
                }
                migrations::run_migrations(conn)
            })
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => ParleyError::Storage {
                    source: other.to_string().into(),
                },
            })
    }
}

/// Maps a tokio-rusqlite failure onto the storage variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ParleyError {
    ParleyError::storage(e)
}

/// Fixed-width UTC timestamp, so text order matches chronological order.
pub(crate) fn to_sql_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn from_sql_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("parley.db");
        let config = StorageConfig {
            database_path: path.display().to_string(),
            wal_mode: true,
            busy_timeout_ms: 1000,
        };
        let db = Database::open(&config).await.unwrap();
        assert!(path.exists());

        let tables: Vec<String> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('chats', 'messages', 'messages_fts') ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>()
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["chats", "messages", "messages_fts"]);
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("twice.db").display().to_string(),
            wal_mode: true,
            busy_timeout_ms: 1000,
        };
        drop(Database::open(&config).await.unwrap());
        Database::open(&config).await.unwrap();
    }

    #[test]
    fn sql_time_sorts_chronologically() {
        let early = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 10, 1, 7, 0, 0).unwrap();
        assert!(to_sql_time(&early) < to_sql_time(&late));
        assert_eq!(to_sql_time(&early), "2024-09-01T08:00:00.000Z");
        assert_eq!(from_sql_time(0, &to_sql_time(&late)).unwrap(), late);
    }
}
