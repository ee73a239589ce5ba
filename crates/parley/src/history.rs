// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley history`: prints the tail of one chat's stored conversation.

use parley_config::ParleyConfig;
use parley_core::{Chat, ConversationStore, Message, ParleyError};
use parley_storage::SqliteStore;

/// One line per message: timestamp, author, bot marker, text.
pub fn format_line(message: &Message) -> String {
    let marker = if message.is_from_bot {
        " [bot]"
    } else if message.is_addressed_to_bot {
        " ->"
    } else {
        ""
    };
    format!(
        "{} {}{}: {}",
        message.occurred_at.format("%Y-%m-%d %H:%M:%S"),
        message.author_label(),
        marker,
        message.text.replace('\n', " ")
    )
}

pub fn format_header(chat_id: i64, chat: Option<&Chat>) -> String {
    match chat {
        Some(chat) => format!(
            "chat {} ({}){}",
            chat_id,
            chat.kind,
            chat.title
                .as_deref()
                .map(|t| format!(" {t}"))
                .unwrap_or_default()
        ),
        None => format!("chat {chat_id} (unknown)"),
    }
}

pub async fn run_history(
    config: &ParleyConfig,
    chat_id: i64,
    limit: usize,
) -> Result<(), ParleyError> {
    let store = SqliteStore::new(config.storage.clone());
    store.initialize().await?;

    let chat = store.get_chat(chat_id).await?;
    let messages = store.last_messages(chat_id, limit).await?;

    println!("{}", format_header(chat_id, chat.as_ref()));
    if messages.is_empty() {
        println!("no messages stored");
    }
    for message in &messages {
        println!("{}", format_line(message));
    }

    store.close().await
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use parley_core::{ChatKind, NO_UPDATE_ID};

    use super::*;

    fn message(text: &str) -> Message {
        Message {
            chat_id: -100,
            message_id: 7,
            update_id: NO_UPDATE_ID,
            author_user_id: Some(42),
            author_username: Some("serega".into()),
            author_first_name: Some("Серёга".into()),
            author_last_name: None,
            text: text.into(),
            occurred_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 2, 0).unwrap(),
            is_from_bot: false,
            is_addressed_to_bot: false,
            inserted_at: None,
        }
    }

    #[test]
    fn plain_line() {
        assert_eq!(
            format_line(&message("привет")),
            "2024-05-01 10:02:00 @serega: привет"
        );
    }

    #[test]
    fn markers_and_newlines() {
        let mut bot = message("раз\nдва");
        bot.is_from_bot = true;
        assert_eq!(format_line(&bot), "2024-05-01 10:02:00 @serega [bot]: раз два");

        let mut addressed = message("Жорик?");
        addressed.is_addressed_to_bot = true;
        addressed.author_username = None;
        assert_eq!(
            format_line(&addressed),
            "2024-05-01 10:02:00 Серёга ->: Жорик?"
        );
    }

    #[test]
    fn header_variants() {
        let chat = Chat::new(-100, ChatKind::Group, Some("Гараж".into()));
        assert_eq!(format_header(-100, Some(&chat)), "chat -100 (group) Гараж");
        assert_eq!(format_header(5, None), "chat 5 (unknown)");
    }
}
