// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The type/filter graph and its derived adjacency indices.
//!
//! Filters live in an arena addressed by [`FilterId`]. Two indices are derived
//! from the arena:
//!
//! - the destination index, `dest -> distinct producer types`, used by the
//!   reachability sweep and the sink signature;
//! - the source index, `source -> outgoing filters` in registration order, used
//!   by chain resolution.
//!
//! Both indices live in one [`OnceLock`]. Insertion patches them in place when
//! they are built; removal drops them together and the next reader rebuilds
//! both. Mutation needs `&mut FilterGraph`, so readers never observe a
//! half-updated index.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{HandleKind, PlanError};
use crate::filter::{Filter, FilterId};
use crate::media::{MediaTypeId, TypeRegistry};

#[derive(Debug, Clone, Default)]
struct Indices {
    /// Destination index: distinct producers per destination type.
    producers: FxHashMap<MediaTypeId, Vec<MediaTypeId>>,
    /// Source index: outgoing filters per source type.
    outgoing: FxHashMap<MediaTypeId, Vec<FilterId>>,
}

impl Indices {
    fn build(filters: &[Option<Filter>]) -> Self {
        let mut idx = Self::default();
        for (slot, filter) in filters.iter().enumerate() {
            let Some(filter) = filter else { continue };
            #[allow(clippy::cast_possible_truncation)] // arena length is capped at u32
            let id = FilterId(slot as u32);
            idx.producers
                .entry(filter.dest)
                .or_default()
                .push(filter.source);
            idx.outgoing.entry(filter.source).or_default().push(id);
        }
        idx
    }

    /// Reserves room for one more edge so the following [`Indices::insert`]
    /// cannot fail halfway.
    fn reserve_edge(&mut self, source: MediaTypeId, dest: MediaTypeId) -> Result<(), PlanError> {
        self.producers.try_reserve(1)?;
        self.outgoing.try_reserve(1)?;
        if let Some(list) = self.producers.get_mut(&dest) {
            list.try_reserve(1)?;
        }
        if let Some(list) = self.outgoing.get_mut(&source) {
            list.try_reserve(1)?;
        }
        Ok(())
    }

    fn insert(&mut self, id: FilterId, source: MediaTypeId, dest: MediaTypeId) {
        // A new (source, dest) pair means `source` is not yet a producer of `dest`.
        self.producers.entry(dest).or_default().push(source);
        self.outgoing.entry(source).or_default().push(id);
    }
}

/// Media types plus the filters that convert between them.
#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    types: TypeRegistry,
    filters: Vec<Option<Filter>>,
    direct: FxHashMap<(MediaTypeId, MediaTypeId), FilterId>,
    indices: OnceLock<Indices>,
}

impl FilterGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph over an existing type registry.
    pub fn with_types(types: TypeRegistry) -> Self {
        Self {
            types,
            ..Self::default()
        }
    }

    /// The type registry backing this graph.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Mutable registry access. Types are append-only, so existing filters and
    /// indices stay valid.
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// Registers (or finds) the media type `super/type`.
    pub fn add_type(&mut self, super_type: &str, sub_type: &str) -> Result<MediaTypeId, PlanError> {
        self.types.add_type(super_type, sub_type)
    }

    /// Registers (or finds) the sink type for `printer_name`.
    pub fn add_sink_type(&mut self, printer_name: &str) -> Result<MediaTypeId, PlanError> {
        self.types.add_sink_type(printer_name)
    }

    /// Adds a filter with no size limit.
    ///
    /// If the pair already has a filter, a strictly lower `cost` replaces the
    /// stored cost and program in place (the size limit is kept); otherwise the
    /// call is a no-op. Either way the handle of the pair's filter is returned.
    pub fn add_filter(
        &mut self,
        source: MediaTypeId,
        dest: MediaTypeId,
        cost: u32,
        program: &str,
    ) -> Result<FilterId, PlanError> {
        self.upsert(source, dest, cost, None, program)
    }

    /// Adds a filter with a size limit (`0` = unlimited).
    ///
    /// Same replacement rule as [`FilterGraph::add_filter`]; a replacement also
    /// overwrites the limit.
    pub fn add_filter_with_max_size(
        &mut self,
        source: MediaTypeId,
        dest: MediaTypeId,
        cost: u32,
        max_size: u64,
        program: &str,
    ) -> Result<FilterId, PlanError> {
        self.upsert(source, dest, cost, Some(max_size), program)
    }

    fn upsert(
        &mut self,
        source: MediaTypeId,
        dest: MediaTypeId,
        cost: u32,
        max_size: Option<u64>,
        program: &str,
    ) -> Result<FilterId, PlanError> {
        self.types.check(source)?;
        self.types.check(dest)?;

        if let Some(&id) = self.direct.get(&(source, dest)) {
            if let Some(existing) = self.filters.get_mut(id.index()).and_then(Option::as_mut) {
                if cost < existing.cost {
                    debug!(
                        filter = id.raw(),
                        old_cost = existing.cost,
                        new_cost = cost,
                        program,
                        "cheaper filter replaces existing edge"
                    );
                    existing.cost = cost;
                    existing.program = program.to_owned();
                    if let Some(max_size) = max_size {
                        existing.max_size = max_size;
                    }
                }
                return Ok(id);
            }
        }

        let raw = u32::try_from(self.filters.len()).map_err(|_| PlanError::InvalidReference {
            kind: HandleKind::Filter,
            index: u32::MAX,
        })?;
        let id = FilterId(raw);

        // Reserve everything up front; after this point nothing can fail.
        self.filters.try_reserve(1)?;
        self.direct.try_reserve(1)?;
        if let Some(indices) = self.indices.get_mut() {
            indices.reserve_edge(source, dest)?;
        }

        self.filters.push(Some(Filter {
            source,
            dest,
            cost,
            max_size: max_size.unwrap_or(0),
            program: program.to_owned(),
        }));
        self.direct.insert((source, dest), id);
        if let Some(indices) = self.indices.get_mut() {
            indices.insert(id, source, dest);
        }
        debug!(
            filter = raw,
            source = source.raw(),
            dest = dest.raw(),
            cost,
            program,
            "filter added"
        );
        Ok(id)
    }

    /// Removes a filter, returning it. Unknown or already removed handles yield `None`.
    ///
    /// Both derived indices are dropped and rebuilt on the next query.
    pub fn remove_filter(&mut self, id: FilterId) -> Option<Filter> {
        let filter = self.filters.get_mut(id.index())?.take()?;
        self.direct.remove(&(filter.source, filter.dest));
        self.indices = OnceLock::new();
        debug!(filter = id.raw(), program = %filter.program, "filter removed; indices dropped");
        Some(filter)
    }

    /// The direct filter `source -> dest`, if one is registered.
    pub fn lookup_direct(&self, source: MediaTypeId, dest: MediaTypeId) -> Option<FilterId> {
        self.direct.get(&(source, dest)).copied()
    }

    /// Like [`FilterGraph::lookup_direct`], returning the filter itself.
    pub fn direct_filter(&self, source: MediaTypeId, dest: MediaTypeId) -> Option<&Filter> {
        self.lookup_direct(source, dest).and_then(|id| self.filter(id))
    }

    /// Returns the filter behind `id` unless it was removed.
    pub fn filter(&self, id: FilterId) -> Option<&Filter> {
        self.filters.get(id.index()).and_then(Option::as_ref)
    }

    /// Live filters in registration order.
    #[allow(clippy::cast_possible_truncation)] // arena length is capped at u32
    pub fn filters(&self) -> impl Iterator<Item = (FilterId, &Filter)> {
        self.filters
            .iter()
            .enumerate()
            .filter_map(|(slot, f)| f.as_ref().map(|f| (FilterId(slot as u32), f)))
    }

    /// Number of live filters.
    pub fn filter_count(&self) -> usize {
        self.direct.len()
    }

    /// Distinct types with at least one direct filter into `dest`.
    pub fn producers_of(&self, dest: MediaTypeId) -> &[MediaTypeId] {
        self.indices()
            .producers
            .get(&dest)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Filters leaving `source`, in registration order.
    pub fn filters_from(&self, source: MediaTypeId) -> impl Iterator<Item = (FilterId, &Filter)> {
        self.indices()
            .outgoing
            .get(&source)
            .map_or(&[][..], Vec::as_slice)
            .iter()
            .filter_map(move |id| self.filter(*id).map(|f| (*id, f)))
    }

    /// Filters entering `dest`, one per producer, in producer order.
    pub fn filters_into(&self, dest: MediaTypeId) -> impl Iterator<Item = (FilterId, &Filter)> {
        self.producers_of(dest).iter().filter_map(move |src| {
            self.lookup_direct(*src, dest)
                .and_then(|id| self.filter(id).map(|f| (id, f)))
        })
    }

    fn indices(&self) -> &Indices {
        self.indices.get_or_init(|| {
            debug!(filters = self.direct.len(), "rebuilding filter indices");
            Indices::build(&self.filters)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn three_types() -> (FilterGraph, MediaTypeId, MediaTypeId, MediaTypeId) {
        let mut g = FilterGraph::new();
        let a = g.add_type("application", "pdf").unwrap();
        let b = g.add_type("application", "postscript").unwrap();
        let c = g.add_type("application", "vnd.cups-raster").unwrap();
        (g, a, b, c)
    }

    #[test]
    fn lower_cost_replaces_in_place() {
        let (mut g, a, b, _) = three_types();
        let first = g.add_filter(a, b, 66, "pdftops").unwrap();
        let second = g.add_filter(a, b, 33, "gstops").unwrap();
        assert_eq!(first, second);
        let f = g.filter(first).unwrap();
        assert_eq!(f.cost, 33);
        assert_eq!(f.program, "gstops");
        assert_eq!(g.filter_count(), 1);
    }

    #[test]
    fn equal_or_higher_cost_is_noop() {
        let (mut g, a, b, _) = three_types();
        let id = g.add_filter(a, b, 33, "pdftops").unwrap();
        g.add_filter(a, b, 33, "other").unwrap();
        g.add_filter(a, b, 99, "worse").unwrap();
        let f = g.filter(id).unwrap();
        assert_eq!(f.cost, 33);
        assert_eq!(f.program, "pdftops");
    }

    #[test]
    fn replacement_keeps_size_limit_unless_given() {
        let (mut g, a, b, _) = three_types();
        let id = g.add_filter_with_max_size(a, b, 50, 4096, "slow").unwrap();
        g.add_filter(a, b, 40, "faster").unwrap();
        assert_eq!(g.filter(id).unwrap().max_size, 4096);
        g.add_filter_with_max_size(a, b, 30, 0, "fastest").unwrap();
        assert_eq!(g.filter(id).unwrap().max_size, 0);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let (mut g, a, _, _) = three_types();
        let bogus = MediaTypeId(99);
        let err = g.add_filter(a, bogus, 1, "x").unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidReference {
                kind: HandleKind::MediaType,
                index: 99
            }
        );
        assert_eq!(g.filter_count(), 0);
    }

    #[test]
    fn indices_track_insertions_after_first_query() {
        let (mut g, a, b, c) = three_types();
        g.add_filter(a, c, 10, "one").unwrap();
        assert_eq!(g.producers_of(c), &[a]);
        // Indices are built now; further inserts patch them.
        g.add_filter(b, c, 10, "two").unwrap();
        g.add_filter(a, b, 10, "three").unwrap();
        assert_eq!(g.producers_of(c), &[a, b]);
        let out: Vec<_> = g.filters_from(a).map(|(_, f)| f.dest).collect();
        assert_eq!(out, vec![c, b]);
    }

    #[test]
    fn removal_drops_and_rebuilds_indices() {
        let (mut g, a, b, c) = three_types();
        let ac = g.add_filter(a, c, 10, "one").unwrap();
        g.add_filter(b, c, 10, "two").unwrap();
        assert_eq!(g.producers_of(c).len(), 2);

        let removed = g.remove_filter(ac).unwrap();
        assert_eq!(removed.program, "one");
        assert!(g.lookup_direct(a, c).is_none());
        assert_eq!(g.producers_of(c), &[b]);
        assert_eq!(g.filters_from(a).count(), 0);
        assert!(g.remove_filter(ac).is_none());
    }

    #[test]
    fn types_added_through_registry_accept_filters() {
        let (mut g, a, _, _) = three_types();
        let media = "image/png".parse().unwrap();
        let png = g.types_mut().insert(media).unwrap();
        g.add_filter(png, a, 32, "imagetopdf").unwrap();
        assert_eq!(g.producers_of(a), &[png]);
    }

    #[test]
    fn re_adding_after_removal_gets_fresh_handle() {
        let (mut g, a, b, _) = three_types();
        let old = g.add_filter(a, b, 10, "one").unwrap();
        g.remove_filter(old);
        let new = g.add_filter(a, b, 20, "two").unwrap();
        assert_ne!(old, new);
        assert_eq!(g.direct_filter(a, b).unwrap().cost, 20);
        let into: Vec<_> = g.filters_into(b).map(|(id, _)| id).collect();
        assert_eq!(into, vec![new]);
    }
}
