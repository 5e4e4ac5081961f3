// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type shared by the registry and the filter graph.

use std::collections::TryReserveError;

use thiserror::Error;

/// Which arena a rejected handle was meant to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    /// A [`MediaTypeId`](crate::MediaTypeId).
    MediaType,
    /// A [`FilterId`](crate::FilterId).
    Filter,
}

impl std::fmt::Display for HandleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MediaType => f.write_str("media type"),
            Self::Filter => f.write_str("filter"),
        }
    }
}

/// Errors raised while building the type/filter graph.
///
/// A missing conversion chain is never an error; resolution returns `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A handle does not name a live entry in this graph.
    #[error("[PLAN_INVALID_REFERENCE] unknown {kind} #{index}")]
    InvalidReference {
        /// Arena the handle belongs to.
        kind: HandleKind,
        /// Raw handle value.
        index: u32,
    },
    /// A super/type name failed validation.
    #[error("[PLAN_INVALID_NAME] {0}")]
    InvalidName(String),
    /// Growing an arena or index failed. Nothing was applied.
    #[error("[PLAN_ALLOCATION_FAILURE] {0}")]
    AllocationFailure(#[from] TryReserveError),
}
