// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions. Each takes a `&Database` and runs on its
//! background thread.

pub mod chats;
pub mod messages;
