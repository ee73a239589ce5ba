// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context pipeline: who is being addressed, what to search for, and which
//! prior messages the generator sees.

pub mod assembler;
pub mod classifier;
pub mod keywords;

pub use assembler::{AssembledContext, ContextAssembler, RetrievalSettings};
pub use classifier::{AddressTrigger, AddressingClassifier};
pub use keywords::KeywordExtractor;
