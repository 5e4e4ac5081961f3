// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scheduler-side planning service.
//!
//! Owns the filter graph and the sink signature cache for one configuration
//! cycle. Reloads swap in a fully loaded graph or keep the old one; queries
//! never see a partially loaded configuration.

use std::collections::BTreeSet;
use std::path::Path;

use spool_plan::{
    FilterChain, FilterGraph, HandleKind, MediaType, MediaTypeId, PlanError, PlannerConfig,
    SearchMode, SinkSignatureCache,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{ConfigError, ConfigService, ConfigStore};
use crate::ports::{DeclarationLoader, PipelineExecutor, PortError, TypeClassifier};

/// Errors surfaced by [`PlanningService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Loading settings failed.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// The graph rejected a type or filter.
    #[error("plan: {0}")]
    Plan(#[from] PlanError),
    /// A collaborator failed.
    #[error("port: {0}")]
    Port(#[from] PortError),
}

/// What the scheduler should do with a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPlan {
    /// Run this chain.
    Planned(FilterChain),
    /// The classifier did not recognize the document.
    Unclassified,
    /// The document's type cannot reach the printer.
    Unsupported(MediaType),
}

/// Graph plus reachability cache for the running configuration.
#[derive(Debug)]
pub struct PlanningService {
    config: PlannerConfig,
    graph: FilterGraph,
    cache: SinkSignatureCache,
}

impl PlanningService {
    /// Creates a service with an empty graph.
    pub fn new(config: PlannerConfig) -> Self {
        info!(
            sink_signature_cache = config.sink_signature_cache,
            "planning service configured"
        );
        Self {
            config,
            graph: FilterGraph::new(),
            cache: SinkSignatureCache::from_config(&config),
        }
    }

    /// Creates a service from stored settings (see [`ConfigService::planner_config`]).
    pub fn from_config_service<S: ConfigStore>(
        config: &ConfigService<S>,
    ) -> Result<Self, ServiceError> {
        Ok(Self::new(config.planner_config()?))
    }

    /// Settings the service was built with.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The current graph.
    pub fn graph(&self) -> &FilterGraph {
        &self.graph
    }

    /// Mutable graph access for runtime extensions between reloads.
    ///
    /// Cached reachability only fingerprints a sink's inbound filters; after
    /// adding filters further upstream, call [`SinkSignatureCache::clear`].
    pub fn graph_mut(&mut self) -> &mut FilterGraph {
        &mut self.graph
    }

    /// The reachability cache.
    pub fn cache(&self) -> &SinkSignatureCache {
        &self.cache
    }

    /// Replaces the graph with a freshly loaded one.
    ///
    /// On loader failure the previous graph and cache stay in place.
    #[instrument(skip_all)]
    pub fn reload<L>(&mut self, loader: &L) -> Result<(), ServiceError>
    where
        L: DeclarationLoader + ?Sized,
    {
        let mut fresh = FilterGraph::new();
        if let Err(err) = loader.load(&mut fresh) {
            warn!(%err, "declaration load failed; keeping previous configuration");
            return Err(err.into());
        }
        info!(
            types = fresh.types().len(),
            filters = fresh.filter_count(),
            "filter graph reloaded"
        );
        self.graph = fresh;
        self.cache.clear();
        Ok(())
    }

    /// Registers printer `name` and the filters feeding its sink type.
    ///
    /// `formats` lists `(input type, cost, program)` per accepted input. The
    /// printer is registered whole or not at all: if any entry is rejected the
    /// graph is left exactly as it was.
    #[instrument(skip(self, formats), fields(formats = formats.len()))]
    pub fn add_printer(
        &mut self,
        name: &str,
        formats: &[(MediaTypeId, u32, &str)],
    ) -> Result<MediaTypeId, ServiceError> {
        let mut staged = self.graph.clone();
        let sink = staged.add_sink_type(name)?;
        for &(source, cost, program) in formats {
            if let Err(err) = staged.add_filter(source, sink, cost, program) {
                warn!(printer = name, %err, "printer rejected; graph unchanged");
                return Err(err.into());
            }
        }
        self.graph = staged;
        info!(printer = name, sink = sink.raw(), "printer registered");
        Ok(sink)
    }

    /// Classifies the document at `path` and plans the cheapest chain to `sink`.
    ///
    /// `size` is the document size in bytes, or `0` if unknown.
    #[instrument(skip(self, classifier))]
    pub fn plan_job<C>(
        &self,
        classifier: &C,
        path: &Path,
        size: u64,
        sink: MediaTypeId,
    ) -> Result<JobPlan, ServiceError>
    where
        C: TypeClassifier + ?Sized,
    {
        let Some(source) = classifier.classify(self.graph.types(), path)? else {
            debug!("document type not recognized");
            return Ok(JobPlan::Unclassified);
        };
        match self.graph.resolve_chain(source, size, sink, SearchMode::Cheapest) {
            Some(chain) => {
                debug!(filters = chain.len(), cost = chain.cost(), "job planned");
                Ok(JobPlan::Planned(chain))
            }
            None => {
                let media = self
                    .graph
                    .types()
                    .get(source)
                    .cloned()
                    .ok_or(PlanError::InvalidReference {
                        kind: HandleKind::MediaType,
                        index: source.raw(),
                    })?;
                debug!(%media, "no chain reaches the printer");
                Ok(JobPlan::Unsupported(media))
            }
        }
    }

    /// Plans the job and hands a found chain to `executor`.
    #[instrument(skip(self, classifier, executor))]
    pub fn run_job<C, E>(
        &self,
        classifier: &C,
        executor: &mut E,
        path: &Path,
        size: u64,
        sink: MediaTypeId,
    ) -> Result<JobPlan, ServiceError>
    where
        C: TypeClassifier + ?Sized,
        E: PipelineExecutor + ?Sized,
    {
        let plan = self.plan_job(classifier, path, size, sink)?;
        if let JobPlan::Planned(chain) = &plan {
            executor.execute(&self.graph, chain, path)?;
        }
        Ok(plan)
    }

    /// Feasibility check without cost minimization.
    pub fn accepts(&self, source: MediaTypeId, sink: MediaTypeId) -> bool {
        self.graph.can_convert(source, 0, sink)
    }

    /// Input types the printer behind `sink` can accept, for capability advertisement.
    pub fn printer_formats(&self, sink: MediaTypeId) -> BTreeSet<MediaType> {
        self.cache.reachable_sources(&self.graph, sink)
    }
}
