// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Mock collaborators and a harness that wires a real SQLite store to the
//! ingestion coordinator, so turns run end to end without network access.

pub mod failing_store;
pub mod harness;
pub mod mock_dispatcher;
pub mod mock_generator;

pub use failing_store::{FailingStore, StoreFault};
pub use harness::{TEST_CHAT_ID, TestHarness, inbound_at};
pub use mock_dispatcher::{MOCK_BOT_USER_ID, MOCK_BOT_USERNAME, MockDispatcher, SentReply};
pub use mock_generator::MockGenerator;
