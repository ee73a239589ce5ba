// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording [`ReplyDispatcher`] for deterministic tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parley_core::{
    Adapter, AdapterType, DispatchReceipt, HealthStatus, ParleyError, ReplyDispatcher,
};
use tokio::sync::Mutex;

/// Bot identity stamped on every receipt.
pub const MOCK_BOT_USER_ID: i64 = 777_000;
pub const MOCK_BOT_USERNAME: &str = "parley_bot";

/// A reply the dispatcher was asked to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReply {
    pub chat_id: i64,
    pub text: String,
    pub reply_to: i64,
    pub message_id: i64,
}

/// Records sent replies and hands out increasing message ids from 10 000.
pub struct MockDispatcher {
    sent: Arc<Mutex<Vec<SentReply>>>,
    next_id: AtomicI64,
    fail: AtomicBool,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicI64::new(10_000),
            fail: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let dispatcher = Self::new();
        dispatcher.set_failing(true);
        dispatcher
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentReply> {
        self.sent.lock().await.clone()
    }
}

impl Default for MockDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockDispatcher {
    fn name(&self) -> &str {
        "mock-dispatcher"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dispatch
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ReplyDispatcher for MockDispatcher {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: i64,
    ) -> Result<DispatchReceipt, ParleyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ParleyError::Dispatch {
                message: "mock dispatcher failure".into(),
                source: None,
            });
        }
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().await.push(SentReply {
            chat_id,
            text: text.to_string(),
            reply_to,
            message_id,
        });
        Ok(DispatchReceipt {
            message_id,
            author_user_id: Some(MOCK_BOT_USER_ID),
            author_username: Some(MOCK_BOT_USERNAME.to_string()),
            author_first_name: Some("Parley".to_string()),
            occurred_at: Utc::now(),
        })
    }
}
