// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! spool-plan: document-conversion planning for the print spooler.
//!
//! Given a document's media type and a printer's native type, the planner
//! picks the cheapest chain of external converter programs ("filters") that
//! turns one into the other, and answers which input types can reach a printer
//! at all.
//!
//! # Layout
//!
//! - [`TypeRegistry`]: case-insensitive `(super, type)` identities behind
//!   [`MediaTypeId`] handles.
//! - [`FilterGraph`]: filter arena plus destination and source indices.
//! - [`FilterGraph::resolve_chain`]: cheapest or first-found chain search.
//! - [`FilterGraph::reachable_sources`]: bounded reverse sweep.
//! - [`SinkSignatureCache`]: shares reachability results between printers
//!   with identical inbound filters.
//!
//! The planner never executes anything and never touches the filesystem. A
//! missing chain is `None`, not an error; [`PlanError`] is reserved for
//! malformed input while building the graph.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod config;
mod error;
mod filter;
mod graph;
mod media;
mod reach;
mod resolve;
mod signature;

pub use config::{PlannerConfig, SINK_CACHE_ENV};
pub use error::{HandleKind, PlanError};
pub use filter::{Filter, FilterId};
pub use graph::FilterGraph;
pub use media::{
    MediaType, MediaTypeId, TypeRegistry, MAX_SUPER_LEN, MAX_TYPE_LEN, SINK_SUPER_TYPE,
};
pub use reach::MAX_REACH_DEPTH;
pub use resolve::{FilterChain, SearchMode};
pub use signature::{
    build_signature, CacheStats, SinkSignature, SinkSignatureCache, SINK_PLACEHOLDER,
};
