// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ports for the collaborators the planner relies on but does not implement.
//!
//! The planner only plans. Sniffing a file's type, parsing declaration files
//! and spawning converter programs happen behind these traits.

use std::path::Path;

use spool_plan::{FilterChain, FilterGraph, MediaTypeId, PlanError, TypeRegistry};
use thiserror::Error;

/// Failure reported by a collaborator.
#[derive(Debug, Error)]
pub enum PortError {
    /// I/O failure while touching the document or declarations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Declarations referenced something the graph rejected.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// Catch-all for collaborator-specific failures.
    #[error("{0}")]
    Other(String),
}

/// Inspects a document and names its media type.
pub trait TypeClassifier {
    /// Returns the registered type of the file at `path`, or `None` if unrecognized.
    fn classify(&self, types: &TypeRegistry, path: &Path)
        -> Result<Option<MediaTypeId>, PortError>;
}

/// Populates a graph from type and filter declarations.
///
/// Implementations have already checked that every program they declare
/// exists and is runnable.
pub trait DeclarationLoader {
    /// Adds the declared types and filters to `graph`.
    fn load(&self, graph: &mut FilterGraph) -> Result<(), PortError>;
}

/// Runs a planned chain.
pub trait PipelineExecutor {
    /// Spawns and pipes the chain's programs over the document at `input`.
    fn execute(
        &mut self,
        graph: &FilterGraph,
        chain: &FilterChain,
        input: &Path,
    ) -> Result<(), PortError>;
}
