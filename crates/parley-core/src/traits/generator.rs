// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-generation collaborator.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::Adapter;
use crate::types::GenerationRequest;

/// Produces a reply from a persona, prior turns and the current message.
///
/// Any failure, including a timeout, is reported as
/// [`ParleyError::Generation`].
#[async_trait]
pub trait TextGenerator: Adapter {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ParleyError>;
}
