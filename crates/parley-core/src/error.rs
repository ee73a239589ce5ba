// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley conversation pipeline.

use std::time::Duration;

use thiserror::Error;

/// Boxed source error carried by the transport-facing variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all Parley adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// A message with the same (chat, message id) pair, or the same nonzero
    /// update id, is already stored. Benign: callers branch on it.
    #[error("duplicate message {message_id} in chat {chat_id}")]
    DuplicateMessage { chat_id: i64, message_id: i64 },

    /// Storage backend errors (connection loss, constraint failures other than duplicates).
    #[error("storage error: {source}")]
    Storage { source: BoxError },

    /// The recency fetch for context assembly failed.
    #[error("retrieval error: {message}")]
    Retrieval {
        message: String,
        source: Option<BoxError>,
    },

    /// The text-generation collaborator failed or ran past the deadline.
    #[error("generation error: {message}")]
    Generation {
        message: String,
        source: Option<BoxError>,
    },

    /// The reply dispatcher failed or ran past the deadline.
    #[error("dispatch error: {message}")]
    Dispatch {
        message: String,
        source: Option<BoxError>,
    },

    /// A store operation ran past the turn deadline.
    #[error("{stage} timed out after {duration:?}")]
    Timeout { stage: String, duration: Duration },

    /// The turn was cancelled while a stage was in flight.
    #[error("{stage} cancelled")]
    Cancelled { stage: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Wraps any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        ParleyError::Storage {
            source: Box::new(err),
        }
    }

    /// Returns true for the benign duplicate outcome.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ParleyError::DuplicateMessage { .. })
    }
}
