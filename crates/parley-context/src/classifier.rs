// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides whether an inbound message is directed at the bot.
//!
//! Two triggers, either one sufficient: a reply to a bot-authored message,
//! or any configured name variant appearing as a case-insensitive substring.
//! Matching is by substring, not whole word.

use parley_config::model::BotConfig;
use parley_core::InboundMessage;

/// Which trigger marked a message as addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressTrigger {
    ReplyToBot,
    NameMention,
}

impl std::fmt::Display for AddressTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressTrigger::ReplyToBot => write!(f, "reply_to_bot"),
            AddressTrigger::NameMention => write!(f, "name_mention"),
        }
    }
}

/// Stateless addressing predicate over a fixed set of name variants.
#[derive(Debug, Clone)]
pub struct AddressingClassifier {
    variants: Vec<String>,
}

impl AddressingClassifier {
    /// Blank variants are dropped; the rest are lower-cased once here.
    pub fn new<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let variants = variants
            .into_iter()
            .map(|v| v.as_ref().trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .collect();
        Self { variants }
    }

    pub fn from_config(bot: &BotConfig) -> Self {
        Self::new(&bot.name_variants)
    }

    pub fn is_addressed_to_bot(&self, message: &InboundMessage) -> bool {
        self.trigger(message).is_some()
    }

    /// The trigger that fired, reply chain first.
    pub fn trigger(&self, message: &InboundMessage) -> Option<AddressTrigger> {
        self.classify(&message.text, message.reply_to_author_is_bot)
    }

    pub fn classify(&self, text: &str, reply_to_bot: bool) -> Option<AddressTrigger> {
        if reply_to_bot {
            Some(AddressTrigger::ReplyToBot)
        } else if self.mentions_bot(text) {
            Some(AddressTrigger::NameMention)
        } else {
            None
        }
    }

    /// Empty text never mentions anyone.
    pub fn mentions_bot(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.variants.iter().any(|v| lowered.contains(v.as_str()))
    }
}
