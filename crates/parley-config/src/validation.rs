// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Collects every violation instead of stopping at the first.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config
        .bot
        .name_variants
        .iter()
        .all(|variant| variant.trim().is_empty())
    {
        fail("bot.name_variants must contain at least one non-empty name".to_string());
    }

    let retrieval = &config.retrieval;
    if retrieval.recent_window_hours == 0 {
        fail("retrieval.recent_window_hours must be greater than zero".to_string());
    }
    // A shorter exclusion window would let relevance results repeat recent ones.
    if retrieval.exclude_window_hours < retrieval.recent_window_hours {
        fail(format!(
            "retrieval.exclude_window_hours ({}) must be at least retrieval.recent_window_hours ({})",
            retrieval.exclude_window_hours, retrieval.recent_window_hours
        ));
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        fail(format!("gateway.host `{host}` is not a valid IP address or hostname"));
    }

    if !config.gateway.webhook_path.starts_with('/') {
        fail(format!(
            "gateway.webhook_path `{}` must start with `/`",
            config.gateway.webhook_path
        ));
    }

    if config.turn.deadline_secs == 0 {
        fail("turn.deadline_secs must be greater than zero".to_string());
    }

    if config.openrouter.timeout_secs == 0 {
        fail("openrouter.timeout_secs must be greater than zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
