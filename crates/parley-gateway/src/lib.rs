// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook gateway for Parley.
//!
//! Receives Telegram updates over HTTP, acknowledges them at once and runs
//! each turn in the background, one turn at a time per chat.

pub mod handlers;
pub mod lanes;
pub mod server;

pub use lanes::ChatLanes;
pub use server::{GatewayState, build_router, start_server};
