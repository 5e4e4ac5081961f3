// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filter chain resolution.
//!
//! A chain is an ordered list of filters whose first source is the document's
//! type and whose last destination is the printer's type. The search is a
//! depth-first walk over the source index that never revisits a type already on
//! the current path, so recursion depth is bounded by the number of types.
//!
//! Two modes exist. [`SearchMode::Cheapest`] explores every feasible chain and
//! keeps the lowest total cost; ties keep whichever chain was found first, so
//! the answer depends on filter registration order. [`SearchMode::FirstFound`]
//! stops at the first feasible chain, for callers that only ask "is this
//! possible at all".

use tracing::trace;

use crate::filter::FilterId;
use crate::graph::FilterGraph;
use crate::media::MediaTypeId;

/// How hard [`FilterGraph::resolve_chain`] searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Return the minimum-cost chain.
    #[default]
    Cheapest,
    /// Return the first feasible chain; its cost is not minimized.
    FirstFound,
}

/// An ordered chain of filters plus its total cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChain {
    filters: Vec<FilterId>,
    cost: u64,
}

impl FilterChain {
    /// Filters to run, first to last.
    pub fn filters(&self) -> &[FilterId] {
        &self.filters
    }

    /// Sum of the filter costs.
    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Number of filters in the chain.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` for a chain with no filters (never produced by the resolver).
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Program names in execution order. Filters removed since resolution are skipped.
    pub fn programs<'g>(&self, graph: &'g FilterGraph) -> Vec<&'g str> {
        self.filters
            .iter()
            .filter_map(|id| graph.filter(*id))
            .map(|f| f.program.as_str())
            .collect()
    }
}

/// Partial result; `steps` is stored destination-first while unwinding.
struct Partial {
    steps: Vec<FilterId>,
    cost: u64,
}

struct Search<'g> {
    graph: &'g FilterGraph,
    size: u64,
    dest: MediaTypeId,
    mode: SearchMode,
    on_path: Vec<bool>,
}

impl Search<'_> {
    fn find(&mut self, current: MediaTypeId, depth: usize) -> Option<Partial> {
        let mut best: Option<Partial> = None;

        if let Some(direct) = self.graph.lookup_direct(current, self.dest) {
            if let Some(filter) = self.graph.filter(direct) {
                if filter.accepts_size(self.size) {
                    trace!(depth, filter = direct.raw(), cost = filter.cost, "direct candidate");
                    best = Some(Partial {
                        steps: vec![direct],
                        cost: u64::from(filter.cost),
                    });
                    if self.mode == SearchMode::FirstFound {
                        return best;
                    }
                }
            }
        }

        let graph = self.graph;
        for (id, filter) in graph.filters_from(current) {
            let mid = filter.dest;
            if mid == self.dest || self.on_path[mid.index()] || !filter.accepts_size(self.size) {
                continue;
            }
            // Costs are non-negative: this edge alone already ties or loses.
            if best
                .as_ref()
                .is_some_and(|b| u64::from(filter.cost) >= b.cost)
            {
                continue;
            }

            self.on_path[mid.index()] = true;
            let tail = self.find(mid, depth + 1);
            self.on_path[mid.index()] = false;

            let Some(mut tail) = tail else { continue };
            let cost = tail.cost + u64::from(filter.cost);
            if best.as_ref().is_none_or(|b| cost < b.cost) {
                trace!(depth, filter = id.raw(), cost, "better chain via intermediate type");
                tail.steps.push(id);
                tail.cost = cost;
                best = Some(tail);
                if self.mode == SearchMode::FirstFound {
                    return best;
                }
            }
        }

        best
    }
}

impl FilterGraph {
    /// Finds a chain converting `source` into `dest`.
    ///
    /// `size` is the input size in bytes; filters whose limit is below it are
    /// skipped. Pass `0` when the size is unknown. `None` means no chain
    /// exists, which is an ordinary answer rather than an error.
    ///
    /// `source == dest` only resolves through an explicitly registered
    /// self-filter; there is no implicit identity conversion. Cycles back to
    /// the source (`a -> b -> a`) are never considered, even when cheaper than
    /// the self-filter, because a chain never revisits its input type.
    pub fn resolve_chain(
        &self,
        source: MediaTypeId,
        size: u64,
        dest: MediaTypeId,
        mode: SearchMode,
    ) -> Option<FilterChain> {
        self.types().get(source)?;
        self.types().get(dest)?;

        if source == dest {
            let id = self.lookup_direct(source, dest)?;
            let filter = self.filter(id)?;
            return filter.accepts_size(size).then(|| FilterChain {
                filters: vec![id],
                cost: u64::from(filter.cost),
            });
        }

        let mut search = Search {
            graph: self,
            size,
            dest,
            mode,
            on_path: vec![false; self.types().len()],
        };
        search.on_path[source.index()] = true;
        let Partial { mut steps, cost } = search.find(source, 0)?;
        steps.reverse();
        trace!(
            source = source.raw(),
            dest = dest.raw(),
            filters = steps.len(),
            cost,
            ?mode,
            "chain resolved"
        );
        Some(FilterChain {
            filters: steps,
            cost,
        })
    }

    /// Minimum-cost chain from `source` to `dest`.
    pub fn cheapest_chain(
        &self,
        source: MediaTypeId,
        size: u64,
        dest: MediaTypeId,
    ) -> Option<FilterChain> {
        self.resolve_chain(source, size, dest, SearchMode::Cheapest)
    }

    /// True when any chain from `source` to `dest` exists.
    pub fn can_convert(&self, source: MediaTypeId, size: u64, dest: MediaTypeId) -> bool {
        self.resolve_chain(source, size, dest, SearchMode::FirstFound)
            .is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Abc {
        g: FilterGraph,
        a: MediaTypeId,
        b: MediaTypeId,
        c: MediaTypeId,
    }

    fn abc() -> Abc {
        let mut g = FilterGraph::new();
        let a = g.add_type("application", "pdf").unwrap();
        let b = g.add_type("application", "postscript").unwrap();
        let c = g.add_type("printer", "office").unwrap();
        Abc { g, a, b, c }
    }

    #[test]
    fn two_hop_beats_expensive_direct() {
        let Abc { mut g, a, b, c } = abc();
        let ab = g.add_filter(a, b, 10, "pdftops").unwrap();
        let bc = g.add_filter(b, c, 5, "pstops").unwrap();
        g.add_filter(a, c, 20, "pdftoraster").unwrap();

        let chain = g.cheapest_chain(a, 0, c).unwrap();
        assert_eq!(chain.filters(), &[ab, bc]);
        assert_eq!(chain.cost(), 15);
        assert_eq!(chain.programs(&g), vec!["pdftops", "pstops"]);
    }

    #[test]
    fn size_limit_forces_direct_fallback() {
        let Abc { mut g, a, b, c } = abc();
        g.add_filter_with_max_size(a, b, 10, 1000, "pdftops").unwrap();
        g.add_filter(b, c, 5, "pstops").unwrap();
        let ac = g.add_filter(a, c, 20, "pdftoraster").unwrap();

        let chain = g.cheapest_chain(a, 5000, c).unwrap();
        assert_eq!(chain.filters(), &[ac]);
        assert_eq!(chain.cost(), 20);

        g.remove_filter(ac);
        assert!(g.cheapest_chain(a, 5000, c).is_none());
        assert!(g.cheapest_chain(a, 500, c).is_some());
    }

    #[test]
    fn first_found_stops_at_direct_edge() {
        let Abc { mut g, a, b, c } = abc();
        g.add_filter(a, b, 10, "pdftops").unwrap();
        g.add_filter(b, c, 5, "pstops").unwrap();
        let ac = g.add_filter(a, c, 20, "pdftoraster").unwrap();

        let chain = g.resolve_chain(a, 0, c, SearchMode::FirstFound).unwrap();
        assert_eq!(chain.filters(), &[ac]);
        assert_eq!(chain.cost(), 20);
        assert!(g.can_convert(a, 0, c));
    }

    #[test]
    fn same_type_needs_explicit_self_filter() {
        let Abc { mut g, a, b, .. } = abc();
        g.add_filter(a, b, 1, "there").unwrap();
        g.add_filter(b, a, 1, "back").unwrap();
        assert!(g.cheapest_chain(a, 0, a).is_none());

        let aa = g.add_filter(a, a, 0, "passthru").unwrap();
        let chain = g.cheapest_chain(a, 0, a).unwrap();
        assert_eq!(chain.filters(), &[aa]);
        assert_eq!(chain.cost(), 0);
    }

    #[test]
    fn same_type_ignores_cheaper_round_trip() {
        let Abc { mut g, a, b, .. } = abc();
        g.add_filter(a, b, 1, "there").unwrap();
        g.add_filter(b, a, 1, "back").unwrap();
        let aa = g.add_filter(a, a, 5, "passthru").unwrap();

        let chain = g.cheapest_chain(a, 0, a).unwrap();
        assert_eq!(chain.filters(), &[aa]);
        assert_eq!(chain.cost(), 5);
    }

    #[test]
    fn cycles_terminate_and_are_not_followed() {
        let Abc { mut g, a, b, c } = abc();
        g.add_filter(a, b, 1, "ab").unwrap();
        g.add_filter(b, a, 1, "ba").unwrap();
        g.add_filter(b, b, 0, "bb").unwrap();
        let bc = g.add_filter(b, c, 1, "bc").unwrap();

        let chain = g.cheapest_chain(a, 0, c).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.filters()[1], bc);
    }

    #[test]
    fn ties_keep_first_registered_route() {
        let mut g = FilterGraph::new();
        let src = g.add_type("text", "plain").unwrap();
        let x = g.add_type("application", "x").unwrap();
        let y = g.add_type("application", "y").unwrap();
        let dst = g.add_type("printer", "p").unwrap();
        let sx = g.add_filter(src, x, 5, "sx").unwrap();
        g.add_filter(src, y, 5, "sy").unwrap();
        g.add_filter(x, dst, 5, "xd").unwrap();
        g.add_filter(y, dst, 5, "yd").unwrap();

        let chain = g.cheapest_chain(src, 0, dst).unwrap();
        assert_eq!(chain.filters()[0], sx);
        assert_eq!(chain.cost(), 10);
    }

    #[test]
    fn unknown_handles_resolve_to_none() {
        let Abc { g, a, .. } = abc();
        assert!(g.cheapest_chain(a, 0, MediaTypeId(77)).is_none());
        assert!(g.cheapest_chain(MediaTypeId(77), 0, a).is_none());
    }
}
