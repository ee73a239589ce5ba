// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram adapter for Parley.
//!
//! Parses webhook updates into [`parley_core::InboundMessage`] and sends
//! replies through the Bot API via teloxide.

pub mod dispatcher;
pub mod update;

pub use dispatcher::{TelegramDispatcher, split_message};
pub use update::{Update, parse_update};
