// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message ingestion: dedupe, persist, classify, and for addressed
//! messages assemble context, generate, dispatch and persist the reply.
//!
//! Stage failures are collected in the [`TurnReport`] rather than raised.
//! Nothing after the message insert is rolled back, so a turn cut short by
//! an error, the deadline or cancellation leaves the inbound message stored
//! and a redelivery is recognised as a duplicate.

use std::sync::Arc;
use std::time::Duration;

use parley_context::{AddressingClassifier, ContextAssembler};
use parley_core::{
    ConversationStore, GenerationRequest, InboundMessage, Message, ParleyError, ReplyDispatcher,
    TextGenerator, TurnOutcome,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::turn::{TurnBudget, TurnReport, TurnStage};

/// Collaborators and settings for an [`IngestionCoordinator`].
pub struct CoordinatorParts {
    pub store: Arc<dyn ConversationStore>,
    pub classifier: AddressingClassifier,
    pub assembler: ContextAssembler,
    pub generator: Arc<dyn TextGenerator>,
    pub dispatcher: Arc<dyn ReplyDispatcher>,
    pub persona: String,
    pub deadline: Duration,
}

/// Entry point the transport layer calls once per authenticated delivery.
pub struct IngestionCoordinator {
    store: Arc<dyn ConversationStore>,
    classifier: AddressingClassifier,
    assembler: ContextAssembler,
    generator: Arc<dyn TextGenerator>,
    dispatcher: Arc<dyn ReplyDispatcher>,
    persona: String,
    deadline: Duration,
}

impl IngestionCoordinator {
    pub fn new(parts: CoordinatorParts) -> Self {
        Self {
            store: parts.store,
            classifier: parts.classifier,
            assembler: parts.assembler,
            generator: parts.generator,
            dispatcher: parts.dispatcher,
            persona: parts.persona,
            deadline: parts.deadline,
        }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    pub fn dispatcher(&self) -> &Arc<dyn ReplyDispatcher> {
        &self.dispatcher
    }

    /// Processes one inbound message under the configured deadline.
    pub async fn handle_inbound_message(&self, msg: InboundMessage) -> TurnReport {
        self.handle_with_cancel(msg, CancellationToken::new()).await
    }

    /// Like [`handle_inbound_message`](Self::handle_inbound_message), but
    /// also stops at the next stage boundary once `cancel` fires.
    pub async fn handle_with_cancel(
        &self,
        msg: InboundMessage,
        cancel: CancellationToken,
    ) -> TurnReport {
        let budget = TurnBudget::new(self.deadline, cancel);
        let mut report = TurnReport::start(&msg);

        match budget
            .run(TurnStage::DedupeCheck, self.store.update_id_exists(msg.update_id))
            .await
        {
            Ok(true) => {
                info!(chat_id = msg.chat_id, update_id = msg.update_id, "redelivery ignored");
                return report.finish(TurnOutcome::Duplicate);
            }
            Ok(false) => {}
            // The unique index still guards the insert below.
            Err(e) => report.fail(TurnStage::DedupeCheck, e),
        }

        if let Err(e) = budget
            .run(TurnStage::ChatUpsert, self.store.upsert_chat(&msg.chat()))
            .await
        {
            report.fail(TurnStage::ChatUpsert, e);
        }

        let trigger = self.classifier.trigger(&msg);
        let stored = Message::from_inbound(&msg, trigger.is_some());
        match budget
            .run(TurnStage::MessagePersist, self.store.insert_message(&stored))
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => {
                debug!(chat_id = msg.chat_id, message_id = msg.message_id, "message already stored");
                return report.finish(TurnOutcome::Duplicate);
            }
            Err(e) => report.fail(TurnStage::MessagePersist, e),
        }

        let Some(trigger) = trigger else {
            return report.finish(TurnOutcome::StoredNotAddressed);
        };
        debug!(
            chat_id = msg.chat_id,
            message_id = msg.message_id,
            stage = %TurnStage::Classify,
            %trigger,
            "message addressed to bot"
        );

        match self.reply(&msg, &budget, &mut report).await {
            Ok(()) => report.finish(TurnOutcome::StoredAndReplied),
            Err((stage, e)) => {
                report.fail(stage, e);
                report.finish(TurnOutcome::StoredReplyFailed)
            }
        }
    }

    /// The addressed branch. A reply-persistence failure is recorded but
    /// does not fail the branch: the user already has the reply.
    async fn reply(
        &self,
        msg: &InboundMessage,
        budget: &TurnBudget,
        report: &mut TurnReport,
    ) -> Result<(), (TurnStage, ParleyError)> {
        let context = budget
            .run(
                TurnStage::ContextAssembly,
                self.assembler.assemble(msg.chat_id, &msg.text),
            )
            .await
            .map_err(|e| (TurnStage::ContextAssembly, e))?;

        let request = GenerationRequest {
            persona: self.persona.clone(),
            turns: context.turns(Some((msg.chat_id, msg.message_id))),
            current: msg.text.clone(),
        };
        let text = budget
            .run(TurnStage::Generation, self.generator.generate(request))
            .await
            .map_err(|e| (TurnStage::Generation, e))?;
        if text.trim().is_empty() {
            return Err((
                TurnStage::Generation,
                ParleyError::Generation {
                    message: "generator returned an empty reply".into(),
                    source: None,
                },
            ));
        }

        let receipt = budget
            .run(
                TurnStage::Dispatch,
                self.dispatcher.send(msg.chat_id, &text, msg.message_id),
            )
            .await
            .map_err(|e| (TurnStage::Dispatch, e))?;
        info!(
            chat_id = msg.chat_id,
            reply_to = msg.message_id,
            reply_id = receipt.message_id,
            "reply dispatched"
        );

        let reply = Message::bot_reply(msg.chat_id, text, &receipt);
        if let Err(e) = budget
            .run(TurnStage::ReplyPersist, self.store.insert_message(&reply))
            .await
        {
            report.fail(TurnStage::ReplyPersist, e);
        }
        Ok(())
    }
}
