// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reachability sweep: every input type that can eventually become `dest`.
//!
//! Instead of resolving a chain from every known type, the sweep walks the
//! destination index backwards from `dest`. Producers that are sink types are
//! walked through but never reported. The walk stops [`MAX_REACH_DEPTH`] levels
//! below the first, so the longest chain it sees has `MAX_REACH_DEPTH + 1`
//! filters.

use std::collections::BTreeSet;

use tracing::trace;

use crate::graph::FilterGraph;
use crate::media::{MediaType, MediaTypeId};

/// Recursion levels below the destination's own producers.
pub const MAX_REACH_DEPTH: usize = 4;

struct Sweep<'g> {
    graph: &'g FilterGraph,
    query: MediaTypeId,
    /// Shallowest depth each type has been expanded at.
    expanded_at: Vec<Option<usize>>,
    found: Vec<bool>,
    order: Vec<MediaTypeId>,
}

impl Sweep<'_> {
    fn collect(&mut self, target: MediaTypeId, depth: usize) {
        let graph = self.graph;
        for &source in graph.producers_of(target) {
            if !graph.types().is_sink(source)
                && !self.found[source.index()]
                && self.reportable(source)
            {
                self.found[source.index()] = true;
                self.order.push(source);
            }

            let next = depth + 1;
            if depth < MAX_REACH_DEPTH
                && self.expanded_at[source.index()].is_none_or(|seen| next < seen)
            {
                trace!(depth = next, source = source.raw(), "expanding producer");
                self.expanded_at[source.index()] = Some(next);
                self.collect(source, next);
            }
        }
    }

    /// The query type only counts as its own input through an explicit self-filter.
    fn reportable(&self, source: MediaTypeId) -> bool {
        source != self.query || self.graph.lookup_direct(source, source).is_some()
    }
}

impl FilterGraph {
    /// Every non-sink type that some chain converts into `dest`, in discovery order.
    pub fn reachable_source_ids(&self, dest: MediaTypeId) -> Vec<MediaTypeId> {
        if self.types().get(dest).is_none() {
            return Vec::new();
        }
        let count = self.types().len();
        let mut sweep = Sweep {
            graph: self,
            query: dest,
            expanded_at: vec![None; count],
            found: vec![false; count],
            order: Vec::new(),
        };
        sweep.expanded_at[dest.index()] = Some(0);
        sweep.collect(dest, 0);
        sweep.order
    }

    /// Every non-sink media type that some chain converts into `dest`.
    ///
    /// Agrees with asking [`FilterGraph::resolve_chain`] for each type with a
    /// size of `0`, as long as the shortest chain fits the depth bound.
    pub fn reachable_sources(&self, dest: MediaTypeId) -> BTreeSet<MediaType> {
        self.reachable_source_ids(dest)
            .into_iter()
            .filter_map(|id| self.types().get(id).cloned())
            .collect()
    }
}
