// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sink signatures and the reachability cache keyed by them.
//!
//! Many printers are fed by the same set of filters. A signature fingerprints
//! the filters entering one destination so that printers with identical
//! inbound configuration can share a single reachability result.
//!
//! # Normalization
//!
//! Inbound edges whose source is itself a sink type (a per-printer prefilter
//! stage) are rewritten to the placeholder `printer/*`, so two printers with
//! the same prefilter chain hash alike even though their private sink names
//! differ. Edges are then sorted by source, cost, size limit and program.
//!
//! # Hash
//!
//! 64-bit FNV-1a over, per edge: source `super/type` bytes, `0x00`, cost as 4
//! little-endian bytes, size limit as 8 little-endian bytes, program bytes,
//! `0x00`. Equal `(edge_count, hash)` pairs are treated as the same
//! configuration without an edge-by-edge comparison.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::config::PlannerConfig;
use crate::graph::FilterGraph;
use crate::media::{MediaType, MediaTypeId, SINK_SUPER_TYPE};

/// Source identity substituted for sink-type sources.
pub const SINK_PLACEHOLDER: &str = "printer/*";

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Fingerprint of one destination's normalized inbound filters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SinkSignature {
    /// Number of inbound filters.
    pub edge_count: usize,
    /// FNV-1a hash of the sorted, normalized filters.
    pub hash: u64,
}

struct Fnv1a(u64);

impl Fnv1a {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }
}

/// Computes the signature of the filters entering `dest`.
pub fn build_signature(graph: &FilterGraph, dest: MediaTypeId) -> SinkSignature {
    let types = graph.types();
    let mut edges: Vec<(String, u32, u64, &str)> = graph
        .filters_into(dest)
        .map(|(_, f)| {
            let source = match types.get(f.source) {
                Some(t) if t.super_type() == SINK_SUPER_TYPE => SINK_PLACEHOLDER.to_owned(),
                Some(t) => t.to_string(),
                None => String::new(),
            };
            (source, f.cost, f.max_size, f.program.as_str())
        })
        .collect();
    edges.sort_unstable();

    let mut hasher = Fnv1a(FNV_OFFSET);
    for (source, cost, max_size, program) in &edges {
        hasher.write(source.as_bytes());
        hasher.write(&[0]);
        hasher.write(&cost.to_le_bytes());
        hasher.write(&max_size.to_le_bytes());
        hasher.write(program.as_bytes());
        hasher.write(&[0]);
    }
    SinkSignature {
        edge_count: edges.len(),
        hash: hasher.0,
    }
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries inserted.
    pub stores: u64,
}

/// Process-wide cache of reachable-source sets keyed by [`SinkSignature`].
///
/// Constructed once by the host and shared by reference. The enable switch is
/// fixed at construction; a disabled cache misses every lookup and ignores
/// every store. Entries are first-writer-wins and never updated.
#[derive(Debug, Default)]
pub struct SinkSignatureCache {
    enabled: bool,
    entries: RwLock<FxHashMap<SinkSignature, BTreeSet<MediaType>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
}

impl SinkSignatureCache {
    /// Creates an empty cache.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Creates an empty cache using the switch from `config`.
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.sink_signature_cache)
    }

    /// Whether lookups and stores are active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns a previously stored set for a destination with the same signature.
    pub fn try_reuse(
        &self,
        graph: &FilterGraph,
        dest: MediaTypeId,
    ) -> Option<BTreeSet<MediaType>> {
        if !self.enabled {
            return None;
        }
        let signature = build_signature(graph, dest);
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(set) = entries.get(&signature) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(dest = dest.raw(), ?signature, "sink signature cache hit");
            Some(set.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(dest = dest.raw(), ?signature, "sink signature cache miss");
            None
        }
    }

    /// Records `set` as the reachable sources for `dest`'s signature.
    ///
    /// Returns `true` when a new entry was inserted; an existing entry wins.
    pub fn store(
        &self,
        graph: &FilterGraph,
        dest: MediaTypeId,
        set: &BTreeSet<MediaType>,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let signature = build_signature(graph, dest);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&signature) {
            return false;
        }
        if let Err(err) = entries.try_reserve(1) {
            warn!(dest = dest.raw(), %err, "sink signature cache full; not storing");
            return false;
        }
        entries.insert(signature, set.clone());
        self.stores.fetch_add(1, Ordering::Relaxed);
        debug!(dest = dest.raw(), ?signature, sources = set.len(), "sink signature stored");
        true
    }

    /// Reachable sources for `dest`, reusing a cached result when possible.
    pub fn reachable_sources(
        &self,
        graph: &FilterGraph,
        dest: MediaTypeId,
    ) -> BTreeSet<MediaType> {
        if let Some(set) = self.try_reuse(graph, dest) {
            return set;
        }
        let set = graph.reachable_sources(dest);
        self.store(graph, dest, &set);
        set
    }

    /// Drops every entry. Hosts call this when the filter graph is reloaded.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored signatures.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the hit/miss/store counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct TwoPrinters {
        g: FilterGraph,
        pdf: MediaTypeId,
        ps: MediaTypeId,
        left: MediaTypeId,
        right: MediaTypeId,
    }

    fn two_printers() -> TwoPrinters {
        let mut g = FilterGraph::new();
        let pdf = g.add_type("application", "pdf").unwrap();
        let ps = g.add_type("application", "postscript").unwrap();
        let left = g.add_sink_type("left").unwrap();
        let right = g.add_sink_type("right").unwrap();
        for sink in [left, right] {
            g.add_filter(pdf, sink, 10, "rastertopwg").unwrap();
            g.add_filter_with_max_size(ps, sink, 20, 1 << 20, "pstopwg")
                .unwrap();
        }
        TwoPrinters {
            g,
            pdf,
            ps,
            left,
            right,
        }
    }

    #[test]
    fn identical_inbound_filters_share_signature() {
        let TwoPrinters { g, left, right, .. } = two_printers();
        let a = build_signature(&g, left);
        let b = build_signature(&g, right);
        assert_eq!(a, b);
        assert_eq!(a.edge_count, 2);
    }

    #[test]
    fn registration_order_does_not_matter() {
        let TwoPrinters {
            mut g, pdf, ps, ..
        } = two_printers();
        let third = g.add_sink_type("third").unwrap();
        g.add_filter_with_max_size(ps, third, 20, 1 << 20, "pstopwg")
            .unwrap();
        g.add_filter(pdf, third, 10, "rastertopwg").unwrap();
        let left = g.types().lookup("printer", "left").unwrap();
        assert_eq!(build_signature(&g, left), build_signature(&g, third));
    }

    #[test]
    fn any_field_change_changes_signature() {
        let base = {
            let TwoPrinters { g, left, .. } = two_printers();
            build_signature(&g, left)
        };
        let variants: [(u32, u64, &str); 3] = [
            (21, 1 << 20, "pstopwg"),
            (20, 1 << 21, "pstopwg"),
            (20, 1 << 20, "pstopwg2"),
        ];
        for (cost, max_size, program) in variants {
            let mut g = FilterGraph::new();
            let pdf = g.add_type("application", "pdf").unwrap();
            let ps = g.add_type("application", "postscript").unwrap();
            let sink = g.add_sink_type("left").unwrap();
            g.add_filter(pdf, sink, 10, "rastertopwg").unwrap();
            g.add_filter_with_max_size(ps, sink, cost, max_size, program)
                .unwrap();
            assert_ne!(build_signature(&g, sink), base, "{cost} {max_size} {program}");
        }
    }

    #[test]
    fn sink_sources_are_normalized() {
        let mut g = FilterGraph::new();
        let pdf = g.add_type("application", "pdf").unwrap();
        let mut sinks = Vec::new();
        for name in ["a", "b"] {
            let pre = g.add_sink_type(&format!("{name}-pre")).unwrap();
            let sink = g.add_sink_type(name).unwrap();
            g.add_filter(pdf, pre, 0, "prefilter").unwrap();
            g.add_filter(pre, sink, 0, "driver").unwrap();
            sinks.push(sink);
        }
        assert_eq!(build_signature(&g, sinks[0]), build_signature(&g, sinks[1]));
    }

    #[test]
    fn store_then_reuse_returns_same_set() {
        let TwoPrinters { g, left, right, .. } = two_printers();
        let cache = SinkSignatureCache::new(true);
        assert!(cache.try_reuse(&g, left).is_none());

        let set = g.reachable_sources(left);
        assert!(cache.store(&g, left, &set));
        assert_eq!(cache.try_reuse(&g, left), Some(set.clone()));
        // Same configuration, different printer.
        assert_eq!(cache.try_reuse(&g, right), Some(set));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 2,
                misses: 1,
                stores: 1
            }
        );
    }

    #[test]
    fn first_writer_wins() {
        let TwoPrinters { g, left, .. } = two_printers();
        let cache = SinkSignatureCache::new(true);
        let first: BTreeSet<MediaType> = ["application/pdf".parse::<MediaType>().unwrap()].into();
        let second = BTreeSet::new();
        assert!(cache.store(&g, left, &first));
        assert!(!cache.store(&g, left, &second));
        assert_eq!(cache.try_reuse(&g, left), Some(first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn disabled_cache_always_recomputes() {
        let TwoPrinters { g, left, .. } = two_printers();
        let cache = SinkSignatureCache::from_config(&PlannerConfig::default());
        assert!(!cache.is_enabled());
        let set = cache.reachable_sources(&g, left);
        assert_eq!(set.len(), 2);
        assert!(cache.is_empty());
        assert!(cache.try_reuse(&g, left).is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn clear_forgets_entries() {
        let TwoPrinters { g, left, .. } = two_printers();
        let cache = SinkSignatureCache::new(true);
        cache.reachable_sources(&g, left);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
