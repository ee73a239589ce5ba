// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Every section is optional and defaults to working values, except the
/// credentials, which stay `None` until supplied.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Bot identity: names it answers to and the persona it speaks with.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram Bot API settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Text generation backend settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Conversation store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Context assembly windows and keyword filtering.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Webhook server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Per-turn processing limits.
    #[serde(default)]
    pub turn: TurnConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Canonical display name.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Every form of the name that addresses the bot, e.g. grammatical cases.
    /// Matched case-insensitively.
    #[serde(default = "default_name_variants")]
    pub name_variants: Vec<String>,

    /// Inline persona text. Overridden by `persona_file` if both are set.
    #[serde(default)]
    pub persona: Option<String>,

    /// Path to a file holding the persona text.
    #[serde(default)]
    pub persona_file: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            name_variants: default_name_variants(),
            persona: None,
            persona_file: None,
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "Жорик".to_string()
}

/// Case forms and nicknames of the default bot name.
pub fn default_name_variants() -> Vec<String> {
    ["жорик", "жорика", "жорику", "жориком", "жорике", "жора", "жорж"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token. Required by `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Path token the webhook must be called with. Defaults to the bot token.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Bot API base URL override, for self-hosted API servers.
    #[serde(default)]
    pub api_url: Option<String>,
}

impl TelegramConfig {
    /// The token expected in the webhook path, if any is configured.
    pub fn webhook_token(&self) -> Option<&str> {
        self.webhook_secret
            .as_deref()
            .or(self.bot_token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// OpenAI-compatible chat completions backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenRouterConfig {
    /// API key. Required by `serve`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL; `/chat/completions` is appended.
    #[serde(default = "default_openrouter_url")]
    pub base_url: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_openrouter_timeout")]
    pub timeout_secs: u64,

    /// Value for the `HTTP-Referer` attribution header.
    #[serde(default)]
    pub referer: Option<String>,

    /// Value for the `X-Title` attribution header.
    #[serde(default)]
    pub title: Option<String>,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openrouter_url(),
            model: default_model(),
            timeout_secs: default_openrouter_timeout(),
            referer: None,
            title: None,
        }
    }
}

fn default_openrouter_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

fn default_openrouter_timeout() -> u64 {
    60
}

/// Conversation store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long a writer waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("parley").join("parley.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("parley.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout() -> u64 {
    5000
}

/// Context assembly configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Messages newer than this are always included as recent context.
    #[serde(default = "default_window_hours")]
    pub recent_window_hours: u64,

    /// Relevance search only considers messages older than this.
    #[serde(default = "default_window_hours")]
    pub exclude_window_hours: u64,

    /// Cap on lexically relevant messages per turn.
    #[serde(default = "default_max_relevant")]
    pub max_relevant_messages: usize,

    /// Minimum recent messages; the window is topped up from the latest
    /// history when it holds fewer. Zero disables the top-up.
    #[serde(default)]
    pub history_floor: usize,

    /// Tokens never used as search keywords.
    #[serde(default = "default_stop_words")]
    pub stop_words: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            recent_window_hours: default_window_hours(),
            exclude_window_hours: default_window_hours(),
            max_relevant_messages: default_max_relevant(),
            history_floor: 0,
            stop_words: default_stop_words(),
        }
    }
}

impl RetrievalConfig {
    pub fn recent_window(&self) -> Duration {
        Duration::from_secs(self.recent_window_hours.saturating_mul(3600))
    }

    pub fn exclude_window(&self) -> Duration {
        Duration::from_secs(self.exclude_window_hours.saturating_mul(3600))
    }
}

fn default_window_hours() -> u64 {
    72
}

fn default_max_relevant() -> usize {
    5
}

/// Russian pronouns, conjunctions, interrogatives and auxiliary verb forms.
pub fn default_stop_words() -> Vec<String> {
    [
        "что", "как", "где", "когда", "почему", "кто", "какой", "какая", "какое", "какие",
        "это", "тот", "тех", "том", "той", "мне", "меня", "мной", "тебе", "тебя", "его",
        "её", "них", "ним", "нам", "для", "про", "без", "при", "над", "под", "через",
        "между", "перед", "после", "или", "ну", "да", "нет", "не", "был", "была", "было",
        "были", "буду", "будет", "будем", "есть", "быть",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Webhook server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path prefix of the webhook route; the token follows it.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

/// Per-turn limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TurnConfig {
    /// Deadline for one inbound message, from dedupe check to reply persistence.
    #[serde(default = "default_deadline")]
    pub deadline_secs: u64,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline(),
        }
    }
}

impl TurnConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

fn default_deadline() -> u64 {
    90
}
