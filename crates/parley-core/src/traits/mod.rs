// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Every collaborator extends the [`Adapter`] base trait and uses
//! `#[async_trait]` so it can sit behind an `Arc<dyn ...>`.

pub mod adapter;
pub mod dispatcher;
pub mod generator;
pub mod store;

pub use adapter::Adapter;
pub use dispatcher::ReplyDispatcher;
pub use generator::TextGenerator;
pub use store::ConversationStore;
