//! Model graph builder: strategy selection and memoized builds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::resolver::NodeContextResolver;
use super::strategy::{
    BundleDeduplication, DedupStrategy, FullDeduplication, NoDeduplication, ParentsDeduplication,
};
use super::{BuildError, ModelGraph};
use crate::inverse::InverseMap;
use crate::pathbuilder::{PathTree, TreeNode};

// ---------------------------------------------------------------------------
// Deduplication
// ---------------------------------------------------------------------------

/// Built-in deduplication modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deduplication {
    None,
    Bundle,
    #[default]
    Parents,
    Full,
}

impl Deduplication {
    pub const ALL: [Self; 4] = [Self::None, Self::Bundle, Self::Parents, Self::Full];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bundle => "bundle",
            Self::Parents => "parents",
            Self::Full => "full",
        }
    }

    /// Instantiate the strategy for this mode.
    #[must_use]
    pub fn strategy(self) -> Box<dyn DedupStrategy> {
        match self {
            Self::None => Box::new(NoDeduplication),
            Self::Bundle => Box::new(BundleDeduplication),
            Self::Parents => Box::new(ParentsDeduplication),
            Self::Full => Box::new(FullDeduplication),
        }
    }
}

impl fmt::Display for Deduplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown deduplication mode {0:?} (expected none, bundle, parents or full)")]
pub struct UnknownDeduplication(String);

impl FromStr for Deduplication {
    type Err = UnknownDeduplication;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| UnknownDeduplication(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

type IncludeFn<'a> = Box<dyn Fn(&TreeNode) -> bool + 'a>;

/// Per-build options.
#[derive(Default)]
pub struct DedupOptions<'a> {
    include: Option<IncludeFn<'a>>,
    pub inverses: InverseMap,
}

impl<'a> DedupOptions<'a> {
    #[must_use]
    pub const fn new(inverses: InverseMap) -> Self {
        Self {
            include: None,
            inverses,
        }
    }

    /// Only materialize nodes for which `include` returns `true`. Excluded
    /// nodes still pass their contexts on to their children.
    #[must_use]
    pub fn with_include(mut self, include: impl Fn(&TreeNode) -> bool + 'a) -> Self {
        self.include = Some(Box::new(include));
        self
    }

    /// Whether `node` is materialized. Everything is, without a predicate.
    #[must_use]
    pub fn includes(&self, node: &TreeNode) -> bool {
        self.include.as_ref().is_none_or(|include| include(node))
    }
}

impl fmt::Debug for DedupOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupOptions")
            .field("include", &self.include.as_ref().map(|_| ".."))
            .field("inverses", &self.inverses)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Owns the model graph for one tree/strategy pair.
///
/// The graph is created empty with the builder; the first successful
/// [`build`](Self::build) populates it and every later call returns the
/// same instance without walking again. Build a fresh builder for a fresh
/// graph.
pub struct ModelGraphBuilder<'a> {
    tree: &'a PathTree,
    options: DedupOptions<'a>,
    strategy: Box<dyn DedupStrategy + 'a>,
    graph: ModelGraph,
    built: bool,
}

impl<'a> ModelGraphBuilder<'a> {
    #[must_use]
    pub fn new(tree: &'a PathTree, options: DedupOptions<'a>, mode: Deduplication) -> Self {
        Self::with_strategy(tree, options, mode.strategy())
    }

    /// Use a custom strategy instead of one of the built-in modes.
    #[must_use]
    pub fn with_strategy(
        tree: &'a PathTree,
        options: DedupOptions<'a>,
        strategy: Box<dyn DedupStrategy + 'a>,
    ) -> Self {
        let graph = ModelGraph::with_acyclic_hint(strategy.definitely_acyclic());
        Self {
            tree,
            options,
            strategy,
            graph,
            built: false,
        }
    }

    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built
    }

    /// The graph in its current state (empty until built).
    #[must_use]
    pub const fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Populate the graph, once.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if an internal invariant breaks, e.g. a
    /// class key already naming a literal node. Built-in strategies never
    /// trigger this on a fresh builder. The graph is reset to empty and the
    /// builder stays unbuilt, so the next call walks the tree again.
    #[instrument(skip_all, fields(strategy = self.strategy.name()))]
    pub fn build(&mut self) -> Result<&ModelGraph, BuildError> {
        if self.built {
            return Ok(&self.graph);
        }
        debug!(paths = self.tree.len(), "building model graph");

        let options = &self.options;
        let include = |node: &TreeNode| options.includes(node);
        let result = NodeContextResolver::new(
            self.tree,
            self.strategy.as_ref(),
            &options.inverses,
            &include,
            &mut self.graph,
        )
        .run();

        if let Err(err) = result {
            self.graph = ModelGraph::with_acyclic_hint(self.strategy.definitely_acyclic());
            return Err(err);
        }

        self.built = true;
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "model graph built"
        );
        Ok(&self.graph)
    }

    /// Build (if needed) and take ownership of the graph.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn into_graph(mut self) -> Result<ModelGraph, BuildError> {
        self.build()?;
        Ok(self.graph)
    }
}

impl fmt::Debug for ModelGraphBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelGraphBuilder")
            .field("strategy", &self.strategy.name())
            .field("options", &self.options)
            .field("built", &self.built)
            .finish_non_exhaustive()
    }
}
