//! Deduplication strategies.
//!
//! | Strategy | Concept context | Datatype context | Acyclic |
//! |---|---|---|---|
//! | [`NoDeduplication`] | fresh | fresh | yes |
//! | [`FullDeduplication`] | one constant | one constant | no |
//! | [`ParentsDeduplication`] | parent's, on shared prefix; else fresh | datatype URI | yes |
//! | [`BundleDeduplication`] | parent's, on shared prefix; else enclosing bundle | enclosing bundle | no |

use super::context::{ContextPart, ContextSpec, NodeContext};
use crate::pathbuilder::{PathElement, PathTree, TreeNode};

/// Everything a strategy may consult for a concept position.
#[derive(Debug, Clone, Copy)]
pub struct ConceptQuery<'a> {
    pub tree: &'a PathTree,
    pub node: &'a TreeNode,
    pub element: &'a PathElement,
    /// All elements of `node`.
    pub elements: &'a [PathElement],
    /// The node is excluded from the graph but still needs contexts.
    pub omitted: bool,
    /// Context of the previous concept in this node, if it resolved.
    pub previous: Option<&'a NodeContext>,
    /// Parent node's context at the same element index, if any.
    pub parent: Option<&'a NodeContext>,
}

/// Everything a strategy may consult for a datatype position.
#[derive(Debug, Clone, Copy)]
pub struct DatatypeQuery<'a> {
    pub tree: &'a PathTree,
    pub node: &'a TreeNode,
    pub element: &'a PathElement,
    pub elements: &'a [PathElement],
    pub omitted: bool,
    /// Context of the concept the datatype property starts from.
    pub concept: &'a NodeContext,
}

/// A pluggable node-sharing policy.
pub trait DedupStrategy {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn concept_context(&self, query: &ConceptQuery<'_>) -> ContextSpec;

    fn datatype_context(&self, query: &DatatypeQuery<'_>) -> ContextSpec;

    /// Whether every graph this strategy produces is guaranteed acyclic.
    fn definitely_acyclic(&self) -> bool;
}

/// Shared-prefix inheritance used by [`ParentsDeduplication`] and
/// [`BundleDeduplication`].
fn inherited(query: &ConceptQuery<'_>) -> Option<ContextSpec> {
    if !query.element.is_shared_with_parent() {
        return None;
    }
    query.parent.map(ContextSpec::reuse)
}

// ---------------------------------------------------------------------------
// None
// ---------------------------------------------------------------------------

/// Literal unfolding of the tree: nothing is ever shared.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeduplication;

impl DedupStrategy for NoDeduplication {
    fn name(&self) -> &'static str {
        "none"
    }

    fn concept_context(&self, _query: &ConceptQuery<'_>) -> ContextSpec {
        ContextSpec::Fresh
    }

    fn datatype_context(&self, _query: &DatatypeQuery<'_>) -> ContextSpec {
        ContextSpec::Fresh
    }

    fn definitely_acyclic(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Full
// ---------------------------------------------------------------------------

/// One node per class URI and per datatype property across the whole tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullDeduplication;

const FULL_CONTEXT: &str = "full";

impl DedupStrategy for FullDeduplication {
    fn name(&self) -> &'static str {
        "full"
    }

    fn concept_context(&self, _query: &ConceptQuery<'_>) -> ContextSpec {
        ContextSpec::key(FULL_CONTEXT)
    }

    fn datatype_context(&self, _query: &DatatypeQuery<'_>) -> ContextSpec {
        ContextSpec::key(FULL_CONTEXT)
    }

    fn definitely_acyclic(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Parents
// ---------------------------------------------------------------------------

/// Share a node with the parent exactly where the path repeats the
/// parent's own path; everything else is fresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParentsDeduplication;

impl DedupStrategy for ParentsDeduplication {
    fn name(&self) -> &'static str {
        "parents"
    }

    fn concept_context(&self, query: &ConceptQuery<'_>) -> ContextSpec {
        inherited(query).unwrap_or(ContextSpec::Fresh)
    }

    fn datatype_context(&self, query: &DatatypeQuery<'_>) -> ContextSpec {
        ContextSpec::key(query.element.uri.as_str())
    }

    fn definitely_acyclic(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Share nodes within the scope of the enclosing bundle.
///
/// Shared-prefix positions inherit the parent's context like
/// [`ParentsDeduplication`]. Every other concept is keyed by the enclosing
/// bundle, so two positions with the same class URI inside one bundle (the
/// bundle itself and its direct fields) collapse, while other bundles keep
/// their own copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleDeduplication;

const ROOT_SCOPE: &str = "";

impl BundleDeduplication {
    fn scope(tree: &PathTree, node: &TreeNode) -> NodeContext {
        let bundle = tree
            .enclosing_bundle(node)
            .map_or(ROOT_SCOPE, TreeNode::id);
        NodeContext::Composite(vec![
            ContextPart::Key("bundle".to_string()),
            ContextPart::Key(bundle.to_string()),
        ])
    }
}

impl DedupStrategy for BundleDeduplication {
    fn name(&self) -> &'static str {
        "bundle"
    }

    fn concept_context(&self, query: &ConceptQuery<'_>) -> ContextSpec {
        inherited(query)
            .unwrap_or_else(|| ContextSpec::Context(Self::scope(query.tree, query.node)))
    }

    fn datatype_context(&self, query: &DatatypeQuery<'_>) -> ContextSpec {
        ContextSpec::Context(Self::scope(query.tree, query.node))
    }

    fn definitely_acyclic(&self) -> bool {
        false
    }
}
