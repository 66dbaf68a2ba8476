//! Model graph: classes, literals and the properties between them.
//!
//! # Overview
//!
//! A [`ModelGraph`] is the deduplicated view of a [`PathTree`]: every
//! concept position becomes (or merges into) a [`ConceptModelNode`], every
//! datatype property ends in a [`LiteralModelNode`], and the properties in
//! between become [`ModelEdge`]s.
//!
//! ## Pipeline
//!
//! ```text
//! PathTree  ──walk()──▶  resolver::NodeContextResolver
//!                          │  asks strategy::DedupStrategy per position
//!                          │  canonicalizes edges via InverseMap
//!                          ▼
//!                        ModelGraph  (memoized by builder::ModelGraphBuilder)
//! ```
//!
//! [`PathTree`]: crate::pathbuilder::PathTree
//! [`InverseMap`]: crate::inverse::InverseMap

pub mod builder;
pub mod context;
pub mod resolver;
pub mod strategy;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::ErrorCode;
use crate::graph::{Graph, GraphError};

pub use builder::{DedupOptions, Deduplication, ModelGraphBuilder, UnknownDeduplication};
pub use context::{ContextPart, ContextSpec, NodeContext};
pub use strategy::DedupStrategy;

/// The graph produced by a build.
pub type ModelGraph = Graph<ModelNode, ModelEdge>;

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// A node of the model graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelNode {
    Concept(ConceptModelNode),
    Literal(LiteralModelNode),
}

/// An ontology class occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ConceptModelNode {
    pub clz: String,
    /// Bundles whose path ends here.
    pub bundles: BTreeSet<String>,
    /// Fields whose path ends here without a datatype property.
    pub fields: BTreeSet<String>,
}

impl ConceptModelNode {
    #[must_use]
    pub fn new(clz: &str) -> Self {
        Self {
            clz: clz.to_string(),
            ..Self::default()
        }
    }
}

/// A literal value reached through a datatype property.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LiteralModelNode {
    /// Fields whose datatype property ends here.
    pub fields: BTreeSet<String>,
}

impl ModelNode {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Concept(_) => "concept",
            Self::Literal(_) => "literal",
        }
    }

    #[must_use]
    pub const fn as_concept(&self) -> Option<&ConceptModelNode> {
        match self {
            Self::Concept(node) => Some(node),
            Self::Literal(_) => None,
        }
    }

    #[must_use]
    pub const fn as_literal(&self) -> Option<&LiteralModelNode> {
        match self {
            Self::Literal(node) => Some(node),
            Self::Concept(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// An edge of the model graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelEdge {
    Property(PropertyModelEdge),
    Data(DataModelEdge),
}

/// Object property between two concepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyModelEdge {
    pub property: String,
    pub inverse_property: Option<String>,
}

/// Datatype property from a concept to a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataModelEdge {
    pub property: String,
    pub inverse_property: Option<String>,
}

impl ModelEdge {
    /// The (canonical) property URI.
    #[must_use]
    pub fn property(&self) -> &str {
        match self {
            Self::Property(edge) => &edge.property,
            Self::Data(edge) => &edge.property,
        }
    }

    #[must_use]
    pub fn inverse_property(&self) -> Option<&str> {
        match self {
            Self::Property(edge) => edge.inverse_property.as_deref(),
            Self::Data(edge) => edge.inverse_property.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Node and edge counts by variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ModelGraphStats {
    pub concept_nodes: usize,
    pub literal_nodes: usize,
    pub property_edges: usize,
    pub data_edges: usize,
    pub definitely_acyclic: bool,
}

impl ModelGraphStats {
    #[must_use]
    pub fn of(graph: &ModelGraph) -> Self {
        let mut stats = Self {
            definitely_acyclic: graph.definitely_acyclic,
            ..Self::default()
        };
        for (_, node) in graph.nodes() {
            match node {
                ModelNode::Concept(_) => stats.concept_nodes += 1,
                ModelNode::Literal(_) => stats.literal_nodes += 1,
            }
        }
        for edge in graph.edges() {
            match edge.label {
                ModelEdge::Property(_) => stats.property_edges += 1,
                ModelEdge::Data(_) => stats.data_edges += 1,
            }
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Internal invariant violations that abort a build.
///
/// Problems with the input itself are never reported here; they are logged
/// and the affected node or edge is skipped.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A key resolved to an existing node of the other variant.
    #[error("node {alias} is a {found} node, expected a {expected} node")]
    NodeKindMismatch {
        alias: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The store refused an edge between two nodes the resolver drew.
    #[error("graph store rejected edge {property} ({from} -> {to})")]
    EdgeRejected {
        property: String,
        from: String,
        to: String,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("failed to encode node key: {0}")]
    Key(#[from] serde_json::Error),
}

impl BuildError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NodeKindMismatch { .. } => ErrorCode::NodeKindMismatch,
            Self::EdgeRejected { .. } => ErrorCode::EdgeRejected,
            Self::Graph(err) => err.code(),
            Self::Key(_) => ErrorCode::InternalUnexpected,
        }
    }
}
