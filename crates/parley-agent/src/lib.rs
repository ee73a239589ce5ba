// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion coordinator for the Parley conversation pipeline.
//!
//! Each inbound message runs through a fixed sequence of [`TurnStage`]s
//! under one deadline; the result is a [`TurnReport`] carrying the
//! [`TurnOutcome`](parley_core::TurnOutcome) and any stage failures.

pub mod coordinator;
pub mod shutdown;
pub mod turn;

pub use coordinator::{CoordinatorParts, IngestionCoordinator};
pub use shutdown::install_signal_handler;
pub use turn::{StageFailure, TurnBudget, TurnReport, TurnStage};
