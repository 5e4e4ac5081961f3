// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filter graph builders keyed by `super/type` names.

use spool_plan::{FilterGraph, MediaTypeId};

/// Fluent builder for test graphs.
///
/// Types are created on first mention, so fixtures read like declaration files.
///
/// # Example
///
/// ```
/// use spool_dry_tests::{type_id, GraphBuilder};
///
/// let graph = GraphBuilder::new()
///     .filter("text/plain", "application/pdf", 32, "texttopdf")
///     .printer("laser", &[("application/pdf", 0, "pdftolaser")])
///     .build();
/// let txt = type_id(&graph, "text/plain");
/// let laser = type_id(&graph, "printer/laser");
/// assert_eq!(graph.cheapest_chain(txt, 0, laser).unwrap().cost(), 32);
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    graph: FilterGraph,
}

impl GraphBuilder {
    /// Start from an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `super/type` name.
    pub fn ty(mut self, name: &str) -> Self {
        self.id(name);
        self
    }

    /// Add an unlimited filter between two `super/type` names.
    pub fn filter(mut self, from: &str, to: &str, cost: u32, program: &str) -> Self {
        let (src, dst) = (self.id(from), self.id(to));
        self.graph
            .add_filter(src, dst, cost, program)
            .expect("fixture filter");
        self
    }

    /// Add a size-limited filter.
    pub fn limited_filter(
        mut self,
        from: &str,
        to: &str,
        cost: u32,
        max_size: u64,
        program: &str,
    ) -> Self {
        let (src, dst) = (self.id(from), self.id(to));
        self.graph
            .add_filter_with_max_size(src, dst, cost, max_size, program)
            .expect("fixture filter");
        self
    }

    /// Add the sink type `printer/<name>` fed by `(input, cost, program)` filters.
    pub fn printer(mut self, name: &str, inputs: &[(&str, u32, &str)]) -> Self {
        let sink = self.graph.add_sink_type(name).expect("fixture printer");
        for &(input, cost, program) in inputs {
            let src = self.id(input);
            self.graph
                .add_filter(src, sink, cost, program)
                .expect("fixture printer filter");
        }
        self
    }

    /// Finish building.
    pub fn build(self) -> FilterGraph {
        self.graph
    }

    fn id(&mut self, name: &str) -> MediaTypeId {
        let (sup, sub) = name.split_once('/').expect("fixture names are super/type");
        self.graph.add_type(sup, sub).expect("fixture type")
    }
}

/// Handle for a `super/type` name that the fixture is known to contain.
pub fn type_id(graph: &FilterGraph, name: &str) -> MediaTypeId {
    graph
        .types()
        .lookup_str(name)
        .unwrap_or_else(|| panic!("fixture has no type {name}"))
}

/// A small office setup: text, images and PostScript funnel through PDF into
/// raster; `image/png -> raster` is only allowed for inputs up to 1 MiB.
///
/// No printers are attached; tests add their own sinks.
pub fn office_graph() -> GraphBuilder {
    GraphBuilder::new()
        .filter("text/plain", "application/pdf", 32, "texttopdf")
        .filter("image/png", "application/pdf", 32, "imagetopdf")
        .filter("application/postscript", "application/pdf", 66, "pstopdf")
        .filter("application/pdf", "application/postscript", 66, "pdftops")
        .filter("application/pdf", "application/vnd.cups-raster", 100, "pdftoraster")
        .limited_filter(
            "image/png",
            "application/vnd.cups-raster",
            50,
            1 << 20,
            "imagetoraster",
        )
}
