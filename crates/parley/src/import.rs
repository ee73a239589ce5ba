// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley import`: loads a Telegram Desktop JSON chat export into the
//! conversation store so older history is searchable from day one.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use parley_config::ParleyConfig;
use parley_context::AddressingClassifier;
use parley_core::{Chat, ChatKind, ConversationStore, Message, NO_UPDATE_ID, ParleyError};
use parley_storage::SqliteStore;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

const EXPORT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Top level of an export's `result.json`.
#[derive(Debug, Deserialize)]
pub struct ChatExport {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub id: i64,
    #[serde(default)]
    pub messages: Vec<ExportMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ExportMessage {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub date: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub from_id: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    /// A plain string, or an array of strings and `{type, text}` entities.
    #[serde(default)]
    pub text: Value,
}

impl ExportMessage {
    pub fn is_service(&self) -> bool {
        self.kind == "service"
    }

    pub fn plain_text(&self) -> String {
        match &self.text {
            Value::String(s) => s.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(entity) => entity.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect(),
            _ => String::new(),
        }
    }

    /// Numeric user id from `actor_id` or `from_id`, with the `user` prefix
    /// stripped. Channel ids and garbage yield `None`.
    pub fn author_user_id(&self) -> Option<i64> {
        let raw = self
            .actor_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.from_id.as_deref())?;
        raw.strip_prefix("user").unwrap_or(raw).parse().ok()
    }

    fn author_name(&self) -> Option<String> {
        self.from
            .as_deref()
            .or(self.actor.as_deref())
            .filter(|s| !s.is_empty())
            .map(String::from)
    }
}

/// Counters reported at the end of an import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    /// Messages stored (or, in a dry run, that would be).
    pub total: usize,
    pub user_messages: usize,
    pub service_messages: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub errors: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "imported:         {}", self.total)?;
        writeln!(f, "  user messages:  {}", self.user_messages)?;
        writeln!(f, "  service:        {}", self.service_messages)?;
        writeln!(f, "skipped (empty):  {}", self.skipped)?;
        writeln!(f, "duplicates:       {}", self.duplicates)?;
        write!(f, "errors:           {}", self.errors)
    }
}

/// Converts one export message. `Ok(None)` means an empty non-service
/// message that is skipped.
pub fn parse_message(
    msg: &ExportMessage,
    chat_id: i64,
    classifier: &AddressingClassifier,
) -> Result<Option<Message>, chrono::ParseError> {
    let occurred_at: DateTime<Utc> =
        NaiveDateTime::parse_from_str(&msg.date, EXPORT_DATE_FORMAT)?.and_utc();
    let text = msg.plain_text();
    if text.is_empty() && !msg.is_service() {
        return Ok(None);
    }

    Ok(Some(Message {
        chat_id,
        message_id: msg.id,
        update_id: NO_UPDATE_ID,
        author_user_id: msg.author_user_id(),
        author_username: None,
        author_first_name: msg.author_name(),
        author_last_name: None,
        is_addressed_to_bot: classifier.classify(&text, false).is_some(),
        text,
        occurred_at,
        is_from_bot: false,
        inserted_at: None,
    }))
}

/// Walks an export; with no store it only parses and counts.
pub struct Importer<'a> {
    store: Option<&'a dyn ConversationStore>,
    classifier: &'a AddressingClassifier,
    verbose: bool,
}

impl<'a> Importer<'a> {
    pub fn new(
        store: Option<&'a dyn ConversationStore>,
        classifier: &'a AddressingClassifier,
        verbose: bool,
    ) -> Self {
        Self {
            store,
            classifier,
            verbose,
        }
    }

    pub async fn import(&self, export: &ChatExport) -> ImportStats {
        info!(
            chat_id = export.id,
            name = export.name.as_deref().unwrap_or(""),
            kind = %export.kind,
            messages = export.messages.len(),
            "importing chat export"
        );

        if let Some(store) = self.store {
            let chat = Chat::new(
                export.id,
                ChatKind::from_network(&export.kind),
                export.name.clone(),
            );
            if let Err(e) = store.upsert_chat(&chat).await {
                warn!(chat_id = export.id, error = %e, "failed to upsert chat");
            }
        }

        let mut stats = ImportStats::default();
        for (i, raw) in export.messages.iter().enumerate() {
            if self.verbose && i > 0 && i % 1000 == 0 {
                info!(done = i, of = export.messages.len(), "import progress");
            }

            let message = match parse_message(raw, export.id, self.classifier) {
                Ok(Some(message)) => message,
                Ok(None) => {
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => {
                    stats.errors += 1;
                    if self.verbose {
                        warn!(message_id = raw.id, date = %raw.date, error = %e, "unparsable message");
                    }
                    continue;
                }
            };

            if let Some(store) = self.store {
                match store.insert_message(&message).await {
                    Ok(()) => {}
                    Err(e) if e.is_duplicate() => {
                        stats.duplicates += 1;
                        if self.verbose {
                            debug!(message_id = raw.id, "already stored");
                        }
                        continue;
                    }
                    Err(e) => {
                        stats.errors += 1;
                        if self.verbose {
                            warn!(message_id = raw.id, error = %e, "failed to store message");
                        }
                        continue;
                    }
                }
            }

            if raw.is_service() {
                stats.service_messages += 1;
            } else {
                stats.user_messages += 1;
            }
            stats.total += 1;
        }

        info!(
            total = stats.total,
            duplicates = stats.duplicates,
            errors = stats.errors,
            "import finished"
        );
        stats
    }
}

pub fn parse_export(bytes: &[u8]) -> Result<ChatExport, ParleyError> {
    serde_json::from_slice(bytes)
        .map_err(|e| ParleyError::Internal(format!("failed to parse chat export: {e}")))
}

pub async fn run_import(
    config: &ParleyConfig,
    file: &Path,
    dry_run: bool,
    verbose: bool,
) -> Result<ImportStats, ParleyError> {
    let bytes = tokio::fs::read(file).await.map_err(|e| {
        ParleyError::Internal(format!("failed to read {}: {e}", file.display()))
    })?;
    let export = parse_export(&bytes)?;
    let classifier = AddressingClassifier::from_config(&config.bot);

    if dry_run {
        return Ok(Importer::new(None, &classifier, verbose).import(&export).await);
    }

    let store = SqliteStore::new(config.storage.clone());
    store.initialize().await?;
    let stats = Importer::new(Some(&store), &classifier, verbose)
        .import(&export)
        .await;
    store.close().await?;
    Ok(stats)
}
