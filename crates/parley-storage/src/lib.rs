// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite conversation store.
//!
//! WAL-mode SQLite with embedded migrations and a single writer thread
//! through `tokio-rusqlite`. Uniqueness of chats, messages and delivery ids
//! is enforced by the schema, so concurrent duplicate deliveries resolve to
//! exactly one row without in-process locking. Lexical relevance uses an
//! FTS5 index ranked by BM25.

pub mod database;
pub mod migrations;
pub mod queries;
pub mod store;

pub use database::Database;
pub use store::SqliteStore;
