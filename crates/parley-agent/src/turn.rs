// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn stages, the per-turn deadline, and the report handed back to the
//! transport layer.

use std::future::Future;
use std::time::Duration;

use parley_core::{InboundMessage, ParleyError, TurnOutcome};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Stages of one inbound message, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    DedupeCheck,
    ChatUpsert,
    MessagePersist,
    Classify,
    ContextAssembly,
    Generation,
    Dispatch,
    ReplyPersist,
}

impl std::fmt::Display for TurnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnStage::DedupeCheck => write!(f, "dedupe_check"),
            TurnStage::ChatUpsert => write!(f, "chat_upsert"),
            TurnStage::MessagePersist => write!(f, "message_persist"),
            TurnStage::Classify => write!(f, "classify"),
            TurnStage::ContextAssembly => write!(f, "context_assembly"),
            TurnStage::Generation => write!(f, "generation"),
            TurnStage::Dispatch => write!(f, "dispatch"),
            TurnStage::ReplyPersist => write!(f, "reply_persist"),
        }
    }
}

/// One stage that did not complete.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: TurnStage,
    pub error: ParleyError,
}

/// Outcome of a turn plus every stage failure met on the way.
///
/// `outcome` names the path the turn took, not what reached the store: a
/// non-duplicate insert failure still ends in one of the `Stored*`
/// outcomes. Check [`TurnReport::inbound_persisted`] or `failures` before
/// relying on the stored row.
#[derive(Debug)]
pub struct TurnReport {
    pub chat_id: i64,
    pub message_id: i64,
    pub update_id: i64,
    pub outcome: TurnOutcome,
    pub failures: Vec<StageFailure>,
}

impl TurnReport {
    pub(crate) fn start(msg: &InboundMessage) -> Self {
        Self {
            chat_id: msg.chat_id,
            message_id: msg.message_id,
            update_id: msg.update_id,
            outcome: TurnOutcome::StoredNotAddressed,
            failures: Vec::new(),
        }
    }

    /// Records and logs a stage failure with the turn's identity.
    pub(crate) fn fail(&mut self, stage: TurnStage, error: ParleyError) {
        let (chat_id, message_id, update_id) = (self.chat_id, self.message_id, self.update_id);
        match stage {
            TurnStage::ChatUpsert | TurnStage::MessagePersist | TurnStage::ReplyPersist => {
                error!(chat_id, message_id, update_id, %stage, error = %error, "turn stage failed");
            }
            _ => {
                warn!(chat_id, message_id, update_id, %stage, error = %error, "turn stage failed");
            }
        }
        self.failures.push(StageFailure { stage, error });
    }

    pub(crate) fn finish(mut self, outcome: TurnOutcome) -> Self {
        self.outcome = outcome;
        debug!(
            chat_id = self.chat_id,
            message_id = self.message_id,
            %outcome,
            failures = self.failures.len(),
            "turn finished"
        );
        self
    }

    /// Whether this turn wrote the inbound message. False for duplicates
    /// and for a failed insert.
    pub fn inbound_persisted(&self) -> bool {
        self.outcome != TurnOutcome::Duplicate
            && self.failed_at(TurnStage::MessagePersist).is_none()
    }

    pub fn failed_at(&self, stage: TurnStage) -> Option<&ParleyError> {
        self.failures
            .iter()
            .find(|f| f.stage == stage)
            .map(|f| &f.error)
    }
}

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline and cancellation shared by every stage of one turn.
#[derive(Debug, Clone)]
pub struct TurnBudget {
    deadline: Instant,
    total: Duration,
    cancel: CancellationToken,
}

impl TurnBudget {
    /// A `total` past what the clock can represent is capped at roughly
    /// thirty years.
    pub fn new(total: Duration, cancel: CancellationToken) -> Self {
        let now = Instant::now();
        Self {
            deadline: now.checked_add(total).unwrap_or(now + FAR_FUTURE),
            total,
            cancel,
        }
    }

    /// Runs one stage, bounded by the deadline and the cancellation token.
    ///
    /// Expiry during generation or dispatch is reported as that
    /// collaborator's own error kind; store stages report `Timeout`.
    pub async fn run<T, F>(&self, stage: TurnStage, fut: F) -> Result<T, ParleyError>
    where
        F: Future<Output = Result<T, ParleyError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(self.cancelled(stage)),
            res = tokio::time::timeout_at(self.deadline, fut) => match res {
                Ok(inner) => inner,
                Err(_) => Err(self.expired(stage)),
            },
        }
    }

    fn expired(&self, stage: TurnStage) -> ParleyError {
        let message = format!("turn deadline of {:?} exceeded", self.total);
        match stage {
            TurnStage::Generation => ParleyError::Generation {
                message,
                source: None,
            },
            TurnStage::Dispatch => ParleyError::Dispatch {
                message,
                source: None,
            },
            _ => ParleyError::Timeout {
                stage: stage.to_string(),
                duration: self.total,
            },
        }
    }

    fn cancelled(&self, stage: TurnStage) -> ParleyError {
        ParleyError::Cancelled {
            stage: stage.to_string(),
        }
    }
}
