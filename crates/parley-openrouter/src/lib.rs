// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenRouter text generator.
//!
//! Implements [`TextGenerator`] over an OpenAI-compatible
//! `/chat/completions` endpoint: the persona becomes the system message,
//! prior turns keep their roles, and the message being answered goes last.

pub mod client;
pub mod types;

use async_trait::async_trait;
use parley_config::model::OpenRouterConfig;
use parley_core::{
    Adapter, AdapterType, GenerationRequest, HealthStatus, ParleyError, TextGenerator,
};
use tracing::{debug, info};

use crate::client::OpenRouterClient;
use crate::types::{ChatMessage, ChatRequest};

/// [`TextGenerator`] backed by OpenRouter.
pub struct OpenRouterGenerator {
    client: OpenRouterClient,
}

impl OpenRouterGenerator {
    /// Fails with [`ParleyError::Config`] when no API key is configured.
    pub fn new(config: &OpenRouterConfig) -> Result<Self, ParleyError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ParleyError::Config(
                    "openrouter.api_key is required (or set PARLEY_OPENROUTER_API_KEY)".into(),
                )
            })?;
        let client = OpenRouterClient::new(api_key, config)?;
        info!(model = %config.model, "OpenRouter generator initialized");
        Ok(Self { client })
    }

    fn to_chat_request(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.turns.len() + 2);
        if !request.persona.trim().is_empty() {
            messages.push(ChatMessage::new("system", request.persona.as_str()));
        }
        messages.extend(
            request
                .turns
                .iter()
                .filter(|t| !t.text.trim().is_empty())
                .map(|t| ChatMessage::new(t.role.to_string(), t.text.as_str())),
        );
        if !request.current.trim().is_empty() {
            messages.push(ChatMessage::new("user", request.current.as_str()));
        }
        ChatRequest {
            model: self.client.model().to_string(),
            messages,
        }
    }
}

#[async_trait]
impl Adapter for OpenRouterGenerator {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl TextGenerator for OpenRouterGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ParleyError> {
        let chat_request = self.to_chat_request(&request);
        debug!(
            model = %chat_request.model,
            messages = chat_request.messages.len(),
            "requesting completion"
        );
        let response = self.client.complete(&chat_request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ParleyError::Generation {
                message: "response contained no choices".into(),
                source: None,
            })?;
        if let Some(usage) = response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }
        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}
