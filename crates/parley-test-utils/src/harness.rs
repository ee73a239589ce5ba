// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end harness: a temp SQLite store behind a [`FailingStore`], mock
//! generator and dispatcher, and a fully wired [`IngestionCoordinator`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_agent::{CoordinatorParts, IngestionCoordinator, TurnReport};
use parley_config::model::{BotConfig, RetrievalConfig, StorageConfig};
use parley_context::{AddressingClassifier, ContextAssembler, KeywordExtractor, RetrievalSettings};
use parley_core::{ChatKind, ConversationStore, InboundMessage, Message, ParleyError};
use parley_storage::SqliteStore;

use crate::failing_store::FailingStore;
use crate::mock_dispatcher::MockDispatcher;
use crate::mock_generator::MockGenerator;

/// Chat used by [`TestHarness::inbound`].
pub const TEST_CHAT_ID: i64 = -1_001_234;

/// Builder for a [`TestHarness`].
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    generator: Option<MockGenerator>,
    bot: BotConfig,
    retrieval: RetrievalConfig,
    persona: String,
    deadline: Duration,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            generator: None,
            bot: BotConfig::default(),
            retrieval: RetrievalConfig::default(),
            persona: "You are a test persona.".to_string(),
            deadline: Duration::from_secs(30),
        }
    }

    /// Replies the generator hands out, in order.
    pub fn with_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Replaces the generator entirely, e.g. a failing or slow one.
    pub fn with_generator(mut self, generator: MockGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_name_variants(mut self, variants: Vec<String>) -> Self {
        self.bot.name_variants = variants;
        self
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn build(self) -> Result<TestHarness, ParleyError> {
        let temp_dir = tempfile::TempDir::new().map_err(ParleyError::storage)?;
        let db_path = temp_dir.path().join("parley-test.db");

        let sqlite = SqliteStore::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            ..StorageConfig::default()
        });
        sqlite.initialize().await?;
        let sqlite: Arc<dyn ConversationStore> = Arc::new(sqlite);
        let store = Arc::new(FailingStore::new(Arc::clone(&sqlite)));

        let generator = Arc::new(
            self.generator
                .unwrap_or_else(|| MockGenerator::with_responses(self.responses)),
        );
        let dispatcher = Arc::new(MockDispatcher::new());

        let assembler = ContextAssembler::new(
            store.clone(),
            KeywordExtractor::from_config(&self.bot, &self.retrieval),
            RetrievalSettings::from(&self.retrieval),
        );
        let coordinator = Arc::new(IngestionCoordinator::new(CoordinatorParts {
            store: store.clone(),
            classifier: AddressingClassifier::from_config(&self.bot),
            assembler,
            generator: generator.clone(),
            dispatcher: dispatcher.clone(),
            persona: self.persona,
            deadline: self.deadline,
        }));

        Ok(TestHarness {
            store,
            sqlite,
            generator,
            dispatcher,
            coordinator,
            _temp_dir: temp_dir,
        })
    }
}

/// A wired coordinator plus handles on every collaborator for assertions.
pub struct TestHarness {
    /// Fault-injecting store the coordinator talks to.
    pub store: Arc<FailingStore>,
    /// The underlying store, bypassing injected faults.
    pub sqlite: Arc<dyn ConversationStore>,
    pub generator: Arc<MockGenerator>,
    pub dispatcher: Arc<MockDispatcher>,
    pub coordinator: Arc<IngestionCoordinator>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A group-chat message in [`TEST_CHAT_ID`] from a human, sent now.
    pub fn inbound(&self, update_id: i64, message_id: i64, text: &str) -> InboundMessage {
        inbound_at(TEST_CHAT_ID, update_id, message_id, text, Utc::now())
    }

    pub async fn deliver(&self, msg: InboundMessage) -> TurnReport {
        self.coordinator.handle_inbound_message(msg).await
    }

    /// Every stored message of `chat_id`, oldest first.
    pub async fn messages(&self, chat_id: i64) -> Result<Vec<Message>, ParleyError> {
        self.sqlite.last_messages(chat_id, usize::MAX).await
    }
}

/// A group-chat message from a human with an explicit timestamp.
pub fn inbound_at(
    chat_id: i64,
    update_id: i64,
    message_id: i64,
    text: &str,
    occurred_at: DateTime<Utc>,
) -> InboundMessage {
    InboundMessage {
        update_id,
        message_id,
        chat_id,
        chat_kind: ChatKind::Group,
        chat_title: Some("test chat".to_string()),
        author_user_id: Some(42),
        author_username: Some("tester".to_string()),
        author_first_name: Some("Test".to_string()),
        author_last_name: None,
        author_is_bot: false,
        text: text.to_string(),
        occurred_at,
        reply_to_author_is_bot: false,
    }
}

#[cfg(test)]
mod tests {
    use parley_core::TurnOutcome;

    use super::*;

    #[tokio::test]
    async fn builder_creates_empty_store() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert!(harness.messages(TEST_CHAT_ID).await.unwrap().is_empty());
        assert!(!harness.sqlite.chat_exists(TEST_CHAT_ID).await.unwrap());
    }

    #[tokio::test]
    async fn addressed_message_gets_scripted_reply() {
        let harness = TestHarness::builder()
            .with_responses(vec!["scripted".to_string()])
            .build()
            .await
            .unwrap();

        let report = harness.deliver(harness.inbound(1, 1, "Жорик, привет")).await;
        assert_eq!(report.outcome, TurnOutcome::StoredAndReplied);

        let sent = harness.dispatcher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "scripted");
        assert_eq!(sent[0].reply_to, 1);
    }
}
