// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fakes for the planner's collaborator ports.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use spool_app_core::ports::{DeclarationLoader, PipelineExecutor, PortError, TypeClassifier};
use spool_plan::{FilterChain, FilterGraph, MediaTypeId, TypeRegistry};

/// Classifies by file extension, e.g. `txt -> text/plain`.
#[derive(Debug, Clone, Default)]
pub struct ExtensionClassifier {
    by_extension: HashMap<String, String>,
}

impl ExtensionClassifier {
    /// Empty classifier; every file is unrecognized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `extension` (without the dot) to a `super/type` name.
    pub fn with(mut self, extension: &str, media_type: &str) -> Self {
        self.by_extension
            .insert(extension.to_ascii_lowercase(), media_type.to_owned());
        self
    }
}

impl TypeClassifier for ExtensionClassifier {
    fn classify(
        &self,
        types: &TypeRegistry,
        path: &Path,
    ) -> Result<Option<MediaTypeId>, PortError> {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Ok(None);
        };
        Ok(self
            .by_extension
            .get(&ext.to_ascii_lowercase())
            .and_then(|name| types.lookup_str(name)))
    }
}

/// One filter line of a [`StaticLoader`]: `(from, to, cost, max_size, program)`.
pub type FilterDecl = (String, String, u32, u64, String);

/// Loads a fixed list of declarations, or fails on demand.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    types: Vec<String>,
    filters: Vec<FilterDecl>,
    fail_with: Option<String>,
}

impl StaticLoader {
    /// Empty declaration set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a `super/type`.
    pub fn ty(mut self, name: &str) -> Self {
        self.types.push(name.to_owned());
        self
    }

    /// Declare an unlimited filter.
    pub fn filter(self, from: &str, to: &str, cost: u32, program: &str) -> Self {
        self.limited_filter(from, to, cost, 0, program)
    }

    /// Declare a size-limited filter.
    pub fn limited_filter(
        mut self,
        from: &str,
        to: &str,
        cost: u32,
        max_size: u64,
        program: &str,
    ) -> Self {
        self.types.push(from.to_owned());
        self.types.push(to.to_owned());
        self.filters.push((
            from.to_owned(),
            to.to_owned(),
            cost,
            max_size,
            program.to_owned(),
        ));
        self
    }

    /// A loader whose `load` always fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_owned()),
            ..Self::default()
        }
    }
}

fn parse_name(name: &str) -> Result<(&str, &str), PortError> {
    name.split_once('/')
        .ok_or_else(|| PortError::Other(format!("bad type name {name:?}")))
}

impl DeclarationLoader for StaticLoader {
    fn load(&self, graph: &mut FilterGraph) -> Result<(), PortError> {
        if let Some(message) = &self.fail_with {
            return Err(PortError::Other(message.clone()));
        }
        for name in &self.types {
            let (sup, sub) = parse_name(name)?;
            graph.add_type(sup, sub)?;
        }
        for (from, to, cost, max_size, program) in &self.filters {
            let (fs, ft) = parse_name(from)?;
            let (ts, tt) = parse_name(to)?;
            let src = graph.add_type(fs, ft)?;
            let dst = graph.add_type(ts, tt)?;
            graph.add_filter_with_max_size(src, dst, *cost, *max_size, program)?;
        }
        Ok(())
    }
}

/// Records executed chains as program lists instead of spawning anything.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    /// `(input path, programs in order)` per executed job.
    pub runs: Vec<(PathBuf, Vec<String>)>,
}

impl RecordingExecutor {
    /// Executor with no recorded runs.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineExecutor for RecordingExecutor {
    fn execute(
        &mut self,
        graph: &FilterGraph,
        chain: &FilterChain,
        input: &Path,
    ) -> Result<(), PortError> {
        let programs = chain
            .programs(graph)
            .into_iter()
            .map(str::to_owned)
            .collect();
        self.runs.push((input.to_path_buf(), programs));
        Ok(())
    }
}
