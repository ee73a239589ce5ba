// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley conversation pipeline.
//!
//! This crate provides the error taxonomy, the chat and message types, and
//! the adapter traits the store, generator and dispatcher implement.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ParleyError;
pub use types::{
    AdapterType, Chat, ChatKind, ConversationTurn, DispatchReceipt, GenerationRequest,
    HealthStatus, InboundMessage, Message, NO_UPDATE_ID, TurnOutcome, TurnRole,
};

pub use traits::{Adapter, ConversationStore, ReplyDispatcher, TextGenerator};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{TimeZone, Utc};

    use super::*;

    fn inbound(kind: ChatKind) -> InboundMessage {
        InboundMessage {
            update_id: 7,
            message_id: 70,
            chat_id: -100,
            chat_kind: kind,
            chat_title: Some("garage".into()),
            author_user_id: Some(42),
            author_username: Some("serega".into()),
            author_first_name: Some("Sergey".into()),
            author_last_name: None,
            author_is_bot: false,
            text: "hello".into(),
            occurred_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            reply_to_author_is_bot: false,
        }
    }

    #[test]
    fn duplicate_is_distinguishable() {
        let dup = ParleyError::DuplicateMessage {
            chat_id: 1,
            message_id: 2,
        };
        assert!(dup.is_duplicate());
        assert!(!ParleyError::storage(std::io::Error::other("disk")).is_duplicate());
        assert!(!ParleyError::Internal("x".into()).is_duplicate());
    }

    #[test]
    fn chat_kind_from_network_types() {
        assert_eq!(ChatKind::from_network("private"), ChatKind::Private);
        assert_eq!(ChatKind::from_network("supergroup"), ChatKind::Group);
        assert_eq!(ChatKind::from_network("group"), ChatKind::Group);
        assert_eq!(ChatKind::from_network("channel"), ChatKind::Other);
        assert_eq!(ChatKind::from_network(""), ChatKind::Other);
    }

    #[test]
    fn chat_kind_round_trips_through_strings() {
        for kind in [ChatKind::Private, ChatKind::Group, ChatKind::Other] {
            let parsed = ChatKind::from_str(&kind.to_string()).expect("should parse back");
            assert_eq!(kind, parsed);
        }
        assert_eq!(ChatKind::Private.to_string(), "private");
    }

    #[test]
    fn group_chat_carries_no_profile() {
        let chat = inbound(ChatKind::Group).chat();
        assert_eq!(chat.title.as_deref(), Some("garage"));
        assert!(chat.username.is_none());
        assert!(chat.first_name.is_none());
    }

    #[test]
    fn private_chat_carries_counterpart_profile() {
        let chat = inbound(ChatKind::Private).chat();
        assert_eq!(chat.username.as_deref(), Some("serega"));
        assert_eq!(chat.first_name.as_deref(), Some("Sergey"));
    }

    #[test]
    fn bot_reply_uses_sentinel_update_id() {
        let receipt = DispatchReceipt {
            message_id: 71,
            author_user_id: Some(999),
            author_username: Some("parley_bot".into()),
            author_first_name: Some("Parley".into()),
            occurred_at: Utc::now(),
        };
        let reply = Message::bot_reply(-100, "sure", &receipt);
        assert_eq!(reply.update_id, NO_UPDATE_ID);
        assert!(reply.is_from_bot);
        assert_eq!(reply.message_id, 71);
        assert_eq!(reply.author_username.as_deref(), Some("parley_bot"));
    }

    #[test]
    fn turn_role_follows_bot_flag() {
        let mut msg = Message::from_inbound(&inbound(ChatKind::Group), false);
        assert_eq!(ConversationTurn::from(&msg).role, TurnRole::User);
        msg.is_from_bot = true;
        assert_eq!(ConversationTurn::from(&msg).role, TurnRole::Assistant);
    }

    #[test]
    fn author_label_prefers_username() {
        let mut msg = Message::from_inbound(&inbound(ChatKind::Group), false);
        assert_eq!(msg.author_label(), "@serega");
        msg.author_username = None;
        assert_eq!(msg.author_label(), "Sergey");
        msg.author_first_name = None;
        assert_eq!(msg.author_label(), "user42");
    }

    #[test]
    fn turn_outcome_display() {
        assert_eq!(TurnOutcome::Duplicate.to_string(), "DUPLICATE");
        assert_eq!(TurnOutcome::StoredReplyFailed.to_string(), "STORED_REPLY_FAILED");
        let json = serde_json::to_string(&TurnOutcome::StoredAndReplied).expect("serialize");
        assert_eq!(json, "\"STORED_AND_REPLIED\"");
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_store<T: ConversationStore>() {}
        fn _assert_generator<T: TextGenerator>() {}
        fn _assert_dispatcher<T: ReplyDispatcher>() {}
    }
}
