// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the ordered prior-message context for one generation turn.
//!
//! Recency is mandatory: if the recent window cannot be read the whole
//! assembly fails. Lexical relevance is best-effort: any search failure
//! degrades to an empty relevant set.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parley_config::model::RetrievalConfig;
use parley_core::{ConversationStore, ConversationTurn, Message, ParleyError};
use tracing::{debug, warn};

use crate::keywords::KeywordExtractor;

/// Window sizes and caps for one assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalSettings {
    pub recent_window: Duration,
    pub exclude_window: Duration,
    pub max_relevant: usize,
    /// Zero disables the top-up from latest history.
    pub history_floor: usize,
}

impl From<&RetrievalConfig> for RetrievalSettings {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            recent_window: config.recent_window(),
            exclude_window: config.exclude_window(),
            max_relevant: config.max_relevant_messages,
            history_floor: config.history_floor,
        }
    }
}

/// Recent and relevant messages for one turn.
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    /// Oldest first.
    pub recent: Vec<Message>,
    /// Most relevant first; disjoint from `recent`.
    pub relevant: Vec<Message>,
    /// The keyword query used for the relevance search; empty when skipped.
    pub query: String,
}

impl AssembledContext {
    /// Prior turns for the generator: relevant first, then recent, each
    /// oldest first.
    ///
    /// The message being answered and empty-text messages are left out.
    pub fn turns(&self, current: Option<(i64, i64)>) -> Vec<ConversationTurn> {
        let mut relevant: Vec<&Message> = self.relevant.iter().collect();
        relevant.sort_by_key(|m| m.occurred_at);
        relevant
            .into_iter()
            .chain(self.recent.iter())
            .filter(|m| Some((m.chat_id, m.message_id)) != current)
            .filter(|m| !m.text.trim().is_empty())
            .map(ConversationTurn::from)
            .collect()
    }
}

/// Reads the store and the keyword extractor to build an [`AssembledContext`].
pub struct ContextAssembler {
    store: Arc<dyn ConversationStore>,
    extractor: KeywordExtractor,
    settings: RetrievalSettings,
}

impl ContextAssembler {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        extractor: KeywordExtractor,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            store,
            extractor,
            settings,
        }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Assembles with the configured settings.
    pub async fn assemble(
        &self,
        chat_id: i64,
        user_message: &str,
    ) -> Result<AssembledContext, ParleyError> {
        let s = self.settings;
        self.assemble_with(chat_id, user_message, s.recent_window, s.max_relevant, s.exclude_window)
            .await
    }

    /// Assembles with explicit windows. Fails only when the recent window
    /// cannot be read, as [`ParleyError::Retrieval`].
    pub async fn assemble_with(
        &self,
        chat_id: i64,
        user_message: &str,
        recent_window: Duration,
        max_relevant: usize,
        exclude_window: Duration,
    ) -> Result<AssembledContext, ParleyError> {
        let now = Utc::now();
        let recent = self
            .store
            .recent_messages_at(chat_id, recent_window, now)
            .await
            .map_err(|e| ParleyError::Retrieval {
                message: format!("reading recent messages of chat {chat_id}"),
                source: Some(Box::new(e)),
            })?;
        let recent = self.top_up(chat_id, recent).await;

        let query = self.extractor.extract(user_message);
        if query.is_empty() {
            debug!(chat_id, "no keywords, skipping relevance search");
            return Ok(AssembledContext {
                recent,
                relevant: Vec::new(),
                query,
            });
        }

        let relevant = match self
            .store
            .search_relevant_messages_at(chat_id, &query, max_relevant, exclude_window, now)
            .await
        {
            Ok(found) => {
                let seen: HashSet<i64> = recent.iter().map(|m| m.message_id).collect();
                found
                    .into_iter()
                    .filter(|m| !seen.contains(&m.message_id))
                    .collect()
            }
            Err(e) => {
                warn!(chat_id, query = %query, error = %e, "relevance search failed, using recent context only");
                Vec::new()
            }
        };

        debug!(
            chat_id,
            recent = recent.len(),
            relevant = relevant.len(),
            query = %query,
            "context assembled"
        );
        Ok(AssembledContext {
            recent,
            relevant,
            query,
        })
    }

    /// Merges in the latest `history_floor` messages when the window is thin.
    async fn top_up(&self, chat_id: i64, recent: Vec<Message>) -> Vec<Message> {
        let floor = self.settings.history_floor;
        if floor == 0 || recent.len() >= floor {
            return recent;
        }
        let latest = match self.store.last_messages(chat_id, floor).await {
            Ok(latest) => latest,
            Err(e) => {
                warn!(chat_id, error = %e, "history top-up failed");
                return recent;
            }
        };
        let mut seen: HashSet<i64> = recent.iter().map(|m| m.message_id).collect();
        let mut merged = recent;
        merged.extend(latest.into_iter().filter(|m| seen.insert(m.message_id)));
        merged.sort_by_key(|m| m.occurred_at);
        merged
    }
}
