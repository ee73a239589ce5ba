// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message insert, windowed reads and full-text search.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_core::{Message, ParleyError};
use rusqlite::{Row, params};

use crate::database::{Database, from_sql_time, map_tr_err, to_sql_time};

const MESSAGE_COLUMNS: &str = "m.chat_id, m.message_id, m.update_id, m.author_user_id, \
     m.author_username, m.author_first_name, m.author_last_name, m.text, \
     m.occurred_at, m.is_from_bot, m.is_addressed_to_bot, m.inserted_at";

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let occurred: String = row.get(8)?;
    let inserted: String = row.get(11)?;
    Ok(Message {
        chat_id: row.get(0)?,
        message_id: row.get(1)?,
        update_id: row.get(2)?,
        author_user_id: row.get(3)?,
        author_username: row.get(4)?,
        author_first_name: row.get(5)?,
        author_last_name: row.get(6)?,
        text: row.get(7)?,
        occurred_at: from_sql_time(8, &occurred)?,
        is_from_bot: row.get(9)?,
        is_addressed_to_bot: row.get(10)?,
        inserted_at: Some(from_sql_time(11, &inserted)?),
    })
}

/// Inserts a message. A uniqueness conflict on `(chat_id, message_id)` or on
/// a nonzero `update_id` inserts nothing and reports
/// [`ParleyError::DuplicateMessage`].
pub async fn insert_message(db: &Database, msg: &Message) -> Result<(), ParleyError> {
    let msg = msg.clone();
    let (chat_id, message_id) = (msg.chat_id, msg.message_id);
    let inserted_at = to_sql_time(&Utc::now());
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (chat_id, message_id, update_id, author_user_id, author_username,
                     author_first_name, author_last_name, text, occurred_at, is_from_bot,
                     is_addressed_to_bot, inserted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT DO NOTHING",
                params![
                    msg.chat_id,
                    msg.message_id,
                    msg.update_id,
                    msg.author_user_id,
                    msg.author_username,
                    msg.author_first_name,
                    msg.author_last_name,
                    msg.text,
                    to_sql_time(&msg.occurred_at),
                    msg.is_from_bot,
                    msg.is_addressed_to_bot,
                    inserted_at,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(ParleyError::DuplicateMessage {
            chat_id,
            message_id,
        });
    }
    Ok(())
}

/// Zero is the bot-reply sentinel and never counts as delivered.
pub async fn update_id_exists(db: &Database, update_id: i64) -> Result<bool, ParleyError> {
    if update_id == 0 {
        return Ok(false);
    }
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM messages WHERE update_id = ?1)",
                params![update_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Messages with `occurred_at >= now - since`, oldest first.
pub async fn recent_messages(
    db: &Database,
    chat_id: i64,
    since: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<Message>, ParleyError> {
    let cutoff = to_sql_time(&window_start(now, since));
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE m.chat_id = ?1 AND m.occurred_at >= ?2
                 ORDER BY m.occurred_at ASC, m.id ASC"
            ))?;
            let rows = stmt.query_map(params![chat_id, cutoff], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// The `limit` latest messages, returned oldest first.
pub async fn last_messages(
    db: &Database,
    chat_id: i64,
    limit: usize,
) -> Result<Vec<Message>, ParleyError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut messages: Vec<Message> = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE m.chat_id = ?1
                 ORDER BY m.occurred_at DESC, m.id DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![chat_id, limit], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    messages.reverse();
    Ok(messages)
}

/// BM25-ranked full-text search over messages older than `now - exclude_recent`.
///
/// Passing the same `now` as to [`recent_messages`] with an equal window
/// makes the two result sets disjoint.
///
/// Each whitespace-separated term of `query` is matched as a quoted FTS5
/// phrase and the terms are OR-ed, so any shared word makes a candidate.
/// Ties fall back to the newest message first.
pub async fn search_relevant_messages(
    db: &Database,
    chat_id: i64,
    query: &str,
    limit: usize,
    exclude_recent: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<Message>, ParleyError> {
    let Some(match_expr) = fts_match_expression(query) else {
        return Ok(Vec::new());
    };
    if limit == 0 {
        return Ok(Vec::new());
    }
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let cutoff = to_sql_time(&window_start(now, exclude_recent));
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages_fts
                 JOIN messages m ON m.id = messages_fts.rowid
                 WHERE messages_fts MATCH ?1 AND m.chat_id = ?2 AND m.occurred_at < ?3
                 ORDER BY bm25(messages_fts), m.occurred_at DESC
                 LIMIT ?4"
            ))?;
            let rows = stmt.query_map(params![match_expr, chat_id, cutoff, limit], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Builds an FTS5 expression with every term quoted, so user text can never
/// inject query syntax. `None` when the query has no terms.
pub(crate) fn fts_match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" OR "))
}

/// `now - window`, saturating at the earliest representable instant.
pub(crate) fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use parley_core::NO_UPDATE_ID;

    use super::*;

    fn message(message_id: i64, update_id: i64, text: &str, age: Duration) -> Message {
        Message {
            chat_id: -1,
            message_id,
            update_id,
            author_user_id: Some(5),
            author_username: Some("vadik".into()),
            author_first_name: None,
            author_last_name: None,
            text: text.to_string(),
            occurred_at: Utc::now() - chrono::Duration::from_std(age).unwrap(),
            is_from_bot: false,
            is_addressed_to_bot: false,
            inserted_at: None,
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn duplicate_pair_is_reported_distinctly() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &message(10, 1, "hi", HOUR)).await.unwrap();
        let err = insert_message(&db, &message(10, 2, "hi again", HOUR))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ParleyError::DuplicateMessage {
                chat_id: -1,
                message_id: 10
            }
        ));
    }

    #[tokio::test]
    async fn duplicate_update_id_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &message(10, 1, "hi", HOUR)).await.unwrap();
        let err = insert_message(&db, &message(11, 1, "redelivered", HOUR))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn zero_update_id_is_exempt() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &message(10, NO_UPDATE_ID, "a", HOUR)).await.unwrap();
        insert_message(&db, &message(11, NO_UPDATE_ID, "b", HOUR)).await.unwrap();
        assert!(!update_id_exists(&db, NO_UPDATE_ID).await.unwrap());
        assert_eq!(last_messages(&db, -1, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_id_exists_after_insert() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(!update_id_exists(&db, 77).await.unwrap());
        insert_message(&db, &message(10, 77, "x", HOUR)).await.unwrap();
        assert!(update_id_exists(&db, 77).await.unwrap());
    }

    #[tokio::test]
    async fn last_messages_are_chronological_and_capped() {
        let db = Database::open_in_memory().await.unwrap();
        for (id, hours) in [(1, 5), (2, 1), (3, 9), (4, 3)] {
            insert_message(&db, &message(id, 0, "t", HOUR * hours)).await.unwrap();
        }
        let last = last_messages(&db, -1, 3).await.unwrap();
        let ids: Vec<i64> = last.iter().map(|m| m.message_id).collect();
        assert_eq!(ids, vec![1, 4, 2]);
    }

    #[tokio::test]
    async fn recent_messages_respect_the_window() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &message(1, 0, "old", HOUR * 100)).await.unwrap();
        insert_message(&db, &message(2, 0, "new", HOUR)).await.unwrap();
        let recent = recent_messages(&db, -1, HOUR * 72, Utc::now()).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message_id, 2);
        assert!(recent[0].inserted_at.is_some());
    }

    #[tokio::test]
    async fn search_only_sees_older_messages_of_the_chat() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &message(1, 0, "Docker контейнер упал", HOUR * 200)).await.unwrap();
        insert_message(&db, &message(2, 0, "docker снова", HOUR)).await.unwrap();
        let mut other_chat = message(3, 0, "docker в другом чате", HOUR * 200);
        other_chat.chat_id = -2;
        insert_message(&db, &other_chat).await.unwrap();

        let found = search_relevant_messages(&db, -1, "docker", 5, HOUR * 72, Utc::now())
            .await
            .unwrap();
        let ids: Vec<i64> = found.iter().map(|m| m.message_id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn search_ranks_and_caps() {
        let db = Database::open_in_memory().await.unwrap();
        for id in 100..108 {
            insert_message(&db, &message(id, 0, "привет всем", HOUR * 150)).await.unwrap();
        }
        insert_message(&db, &message(1, 0, "погода", HOUR * 100)).await.unwrap();
        insert_message(&db, &message(2, 0, "погода и снова погода", HOUR * 110)).await.unwrap();
        insert_message(&db, &message(3, 0, "машина", HOUR * 120)).await.unwrap();
        insert_message(&db, &message(4, 0, "ПОГОДА машина", HOUR * 130)).await.unwrap();

        let found = search_relevant_messages(&db, -1, "погода машина", 2, HOUR * 72, Utc::now())
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].message_id, 4);
    }

    #[tokio::test]
    async fn search_with_quotes_does_not_break_the_query() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &message(1, 0, "say \"hello\"", HOUR * 100)).await.unwrap();
        let found = search_relevant_messages(&db, -1, "\"hello AND OR", 5, HOUR, Utc::now())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(search_relevant_messages(&db, -1, "   ", 5, HOUR, Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_window_covers_all_history() {
        let db = Database::open_in_memory().await.unwrap();
        insert_message(&db, &message(1, 0, "очень старая рыбалка", HOUR * 24 * 365 * 20))
            .await
            .unwrap();
        insert_message(&db, &message(2, 0, "свежая рыбалка", HOUR)).await.unwrap();

        let huge = Duration::from_secs(3_000_000_000 * 3600);
        let recent = recent_messages(&db, -1, huge, Utc::now()).await.unwrap();
        assert_eq!(recent.len(), 2);

        let found = search_relevant_messages(&db, -1, "рыбалка", 5, huge, Utc::now())
            .await
            .unwrap();
        assert!(found.is_empty());

        let max = recent_messages(&db, -1, Duration::MAX, Utc::now()).await.unwrap();
        assert_eq!(max.len(), 2);
    }

    #[test]
    fn window_start_saturates() {
        let now = Utc::now();
        assert_eq!(window_start(now, Duration::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(
            window_start(now, Duration::from_secs(3_000_000_000 * 3600)),
            DateTime::<Utc>::MIN_UTC
        );
        assert_eq!(window_start(now, HOUR), now - chrono::Duration::hours(1));
    }

    #[tokio::test]
    async fn shared_instant_keeps_window_and_search_disjoint() {
        let db = Database::open_in_memory().await.unwrap();
        let now = Utc::now();
        let mut edge = message(1, 0, "граница окна", HOUR);
        edge.occurred_at = now - chrono::Duration::hours(72);
        insert_message(&db, &edge).await.unwrap();

        let recent = recent_messages(&db, -1, HOUR * 72, now).await.unwrap();
        let found = search_relevant_messages(&db, -1, "граница", 5, HOUR * 72, now)
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert!(found.is_empty());
    }

    #[test]
    fn match_expression_quotes_terms() {
        assert_eq!(fts_match_expression("a b").as_deref(), Some("\"a\" OR \"b\""));
        assert_eq!(fts_match_expression("x\"y").as_deref(), Some("\"x\"\"y\""));
        assert!(fts_match_expression("").is_none());
    }
}
