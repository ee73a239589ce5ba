// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based loader.
//!
//! Lookup order: `/etc/parley/parley.toml`, then `~/.config/parley/parley.toml`,
//! then `./parley.toml`, then `PARLEY_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::diagnostic::ConfigError;
use crate::model::{BotConfig, ParleyConfig};

/// Top-level sections, used to turn `PARLEY_SECTION_KEY` into `section.key`.
const SECTIONS: &[&str] = &[
    "bot",
    "telegram",
    "openrouter",
    "storage",
    "retrieval",
    "gateway",
    "turn",
];

const SYSTEM_CONFIG: &str = "/etc/parley/parley.toml";
const LOCAL_CONFIG: &str = "parley.toml";

const DEFAULT_PERSONA: &str = "You are a long-standing member of this group chat. \
Answer in the language of the conversation, stay in character and keep replies short.";

fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("parley").join("parley.toml"))
        .unwrap_or_default()
}

/// Every file the hierarchy reads, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from(SYSTEM_CONFIG),
        user_config_path(),
        PathBuf::from(LOCAL_CONFIG),
    ]
}

/// The full layered figment before extraction.
pub fn build_figment() -> Figment {
    config_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(ParleyConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<ParleyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from one file plus env var overrides, skipping the hierarchy.
pub fn load_config_from_path(path: &Path) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string over the compiled defaults.
pub fn load_config_from_str(toml_content: &str) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Maps `PARLEY_TELEGRAM_BOT_TOKEN` to `telegram.bot_token`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores survive intact.
fn env_provider() -> Env {
    Env::prefixed("PARLEY_").map(|key| {
        let key_str = key.as_str();
        SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key_str.to_string())
            .into()
    })
}

/// Resolves the persona text: `persona_file` wins over `persona`, which
/// wins over the built-in default.
pub fn resolve_persona(bot: &BotConfig) -> Result<String, ConfigError> {
    if let Some(path) = bot.persona_file.as_deref() {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Validation {
            message: format!("bot.persona_file `{path}` could not be read: {e}"),
        })?;
        return Ok(text.trim().to_string());
    }
    Ok(bot
        .persona
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PERSONA)
        .to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PARLEY_TELEGRAM_BOT_TOKEN", "123:abc");
            jail.set_env("PARLEY_RETRIEVAL_MAX_RELEVANT_MESSAGES", "9");
            let config: ParleyConfig = Figment::new()
                .merge(Serialized::defaults(ParleyConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.telegram.bot_token.as_deref(), Some("123:abc"));
            assert_eq!(config.retrieval.max_relevant_messages, 9);
            Ok(())
        });
    }

    #[test]
    fn persona_defaults_when_unset() {
        let persona = resolve_persona(&BotConfig::default()).expect("default persona");
        assert_eq!(persona, DEFAULT_PERSONA);
    }

    #[test]
    fn persona_file_overrides_inline() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "  file persona  ").expect("write");
        let bot = BotConfig {
            persona: Some("inline".into()),
            persona_file: Some(file.path().display().to_string()),
            ..BotConfig::default()
        };
        assert_eq!(resolve_persona(&bot).expect("persona"), "file persona");
    }

    #[test]
    fn missing_persona_file_is_a_validation_error() {
        let bot = BotConfig {
            persona_file: Some("/nonexistent/persona.md".into()),
            ..BotConfig::default()
        };
        assert!(matches!(
            resolve_persona(&bot),
            Err(ConfigError::Validation { .. })
        ));
    }
}
