// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration system.

use std::io::Write;

use parley_config::diagnostic::ConfigError;
use parley_config::model::ParleyConfig;
use parley_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[bot]
name = "Gosha"
name_variants = ["gosha", "goshan"]
persona = "You are Gosha."
log_level = "debug"

[telegram]
bot_token = "123:ABC"
webhook_secret = "s3cret"

[openrouter]
api_key = "sk-or-1"
model = "openai/gpt-4o-mini"
timeout_secs = 15

[storage]
database_path = "/tmp/parley-test.db"
wal_mode = false

[retrieval]
recent_window_hours = 24
exclude_window_hours = 48
max_relevant_messages = 3
history_floor = 20
stop_words = ["the", "and"]

[gateway]
host = "127.0.0.1"
port = 9000

[turn]
deadline_secs = 30
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "Gosha");
    assert_eq!(config.bot.name_variants, vec!["gosha", "goshan"]);
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.telegram.webhook_token(), Some("s3cret"));
    assert_eq!(config.openrouter.model, "openai/gpt-4o-mini");
    assert_eq!(config.openrouter.timeout_secs, 15);
    assert!(!config.storage.wal_mode);
    assert_eq!(config.retrieval.recent_window().as_secs(), 24 * 3600);
    assert_eq!(config.retrieval.exclude_window().as_secs(), 48 * 3600);
    assert_eq!(config.retrieval.max_relevant_messages, 3);
    assert_eq!(config.retrieval.history_floor, 20);
    assert_eq!(config.retrieval.stop_words, vec!["the", "and"]);
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.turn.deadline().as_secs(), 30);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    let defaults = ParleyConfig::default();
    assert_eq!(config.bot.name_variants, defaults.bot.name_variants);
    assert!(config.bot.name_variants.contains(&"жорик".to_string()));
    assert_eq!(config.retrieval.max_relevant_messages, 5);
    assert_eq!(config.retrieval.recent_window_hours, 72);
    assert_eq!(config.retrieval.exclude_window_hours, 72);
    assert!(config.retrieval.stop_words.contains(&"когда".to_string()));
    assert_eq!(config.openrouter.base_url, "https://openrouter.ai/api/v1");
    assert_eq!(config.openrouter.model, "anthropic/claude-3.5-sonnet");
    assert!(config.telegram.bot_token.is_none());
    assert!(config.telegram.webhook_token().is_none());
}

#[test]
fn webhook_token_falls_back_to_bot_token() {
    let config = load_config_from_str("[telegram]\nbot_token = \"123:ABC\"\n").expect("valid");
    assert_eq!(config.telegram.webhook_token(), Some("123:ABC"));
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let errors = load_and_validate_str("[retrieval]\nmax_relevant_mesages = 3\n")
        .expect_err("unknown key must be rejected");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("max_relevant_messages"));
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n")
        .expect_err("string port must be rejected");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port")))
    );
}

#[test]
fn validation_runs_after_load() {
    let errors = load_and_validate_str("[turn]\ndeadline_secs = 0\n")
        .expect_err("zero deadline must be rejected");
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("deadline")));
}

#[test]
fn keep_all_history_window_saturates() {
    let config = load_and_validate_str(
        "[retrieval]\nrecent_window_hours = 9223372036854775807\nexclude_window_hours = 9223372036854775807\n",
    )
    .expect("huge windows are valid");
    assert_eq!(config.retrieval.recent_window().as_secs(), u64::MAX);
    assert_eq!(config.retrieval.exclude_window().as_secs(), u64::MAX);
}

#[test]
fn explicit_path_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[storage]\ndatabase_path = \"/tmp/explicit.db\"").expect("write");
    let config = load_and_validate_path(file.path()).expect("valid file");
    assert_eq!(config.storage.database_path, "/tmp/explicit.db");
}

#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("parley.toml", "[gateway]\nport = 9000\n")?;
        jail.set_env("PARLEY_GATEWAY_PORT", "9100");
        let config = load_and_validate_path(std::path::Path::new("parley.toml"))
            .map_err(|e| format!("{e:?}"))?;
        assert_eq!(config.gateway.port, 9100);
        Ok(())
    });
}
