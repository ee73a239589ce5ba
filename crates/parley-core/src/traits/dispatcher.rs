// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound reply delivery.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::Adapter;
use crate::types::DispatchReceipt;

/// Delivers a generated reply to the messaging network.
#[async_trait]
pub trait ReplyDispatcher: Adapter {
    /// Sends `text` to `chat_id` as a reply to `reply_to`. Failures are
    /// reported as [`ParleyError::Dispatch`].
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: i64,
    ) -> Result<DispatchReceipt, ParleyError>;
}
