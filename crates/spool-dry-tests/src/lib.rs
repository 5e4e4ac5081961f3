// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for spool crates.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`graph`] - Filter graph builders and the office fixture
//! - [`ports`] - Fake classifier, declaration loader and pipeline executor
#![forbid(unsafe_code)]
// Fixture builders fail loudly on malformed fixture input.
#![allow(clippy::expect_used, clippy::panic)]

pub mod config;
pub mod graph;
pub mod ports;

// Re-export commonly used items at crate root for convenience
pub use config::InMemoryConfigStore;
pub use graph::{office_graph, type_id, GraphBuilder};
pub use ports::{ExtensionClassifier, RecordingExecutor, StaticLoader};
