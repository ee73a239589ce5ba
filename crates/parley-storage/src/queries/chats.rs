// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat upsert and lookup.

use std::str::FromStr;

use chrono::Utc;
use parley_core::{Chat, ChatKind, ParleyError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, from_sql_time, map_tr_err, to_sql_time};

/// Inserts the chat, or refreshes `updated_at` and fills empty profile
/// fields of the existing row. `kind` and `title` keep their first values.
pub async fn upsert_chat(db: &Database, chat: &Chat) -> Result<(), ParleyError> {
    let chat = chat.clone();
    let now = to_sql_time(&Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chats (chat_id, kind, title, username, first_name, last_name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     updated_at = excluded.updated_at,
                     username   = COALESCE(NULLIF(chats.username, ''), excluded.username),
                     first_name = COALESCE(NULLIF(chats.first_name, ''), excluded.first_name),
                     last_name  = COALESCE(NULLIF(chats.last_name, ''), excluded.last_name)",
                params![
                    chat.chat_id,
                    chat.kind.to_string(),
                    chat.title,
                    chat.username,
                    chat.first_name,
                    chat.last_name,
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn chat_exists(db: &Database, chat_id: i64) -> Result<bool, ParleyError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM chats WHERE chat_id = ?1)",
                params![chat_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_chat(db: &Database, chat_id: i64) -> Result<Option<Chat>, ParleyError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT chat_id, kind, title, username, first_name, last_name, created_at, updated_at
                 FROM chats WHERE chat_id = ?1",
                params![chat_id],
                |row| {
                    let kind: String = row.get(1)?;
                    let created: String = row.get(6)?;
                    let updated: String = row.get(7)?;
                    Ok(Chat {
                        chat_id: row.get(0)?,
                        kind: ChatKind::from_str(&kind).unwrap_or(ChatKind::Other),
                        title: row.get(2)?,
                        username: row.get(3)?,
                        first_name: row.get(4)?,
                        last_name: row.get(5)?,
                        created_at: Some(from_sql_time(6, &created)?),
                        updated_at: Some(from_sql_time(7, &updated)?),
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
