//! Node contexts: the equivalence keys that decide node sharing.
//!
//! A strategy answers every concept or datatype position with a
//! [`ContextSpec`]. The resolver turns the spec into a [`NodeContext`]
//! (or nothing, for [`ContextSpec::Skip`]). Two tree positions whose
//! `(context, kind, uri)` triples compare equal share one graph node.

use serde::Serialize;

/// One component of a composite context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextPart {
    Key(String),
    Number(u64),
}

/// A resolved equivalence key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeContext {
    /// Stable caller-chosen key.
    Key(String),
    /// Fresh context handed out by the resolver, or a number a strategy
    /// chose itself.
    Number(u64),
    /// Composite key.
    Composite(Vec<ContextPart>),
    /// Reserved context for literal nodes. Only the resolver can build one.
    Literal(LiteralContext),
}

/// Context of a literal node: the datatype context a strategy chose, folded
/// together with the context of the concept the literal hangs off.
///
/// Fields are private, so no strategy can forge one; equal raw datatype
/// contexts under different parent concepts therefore never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LiteralContext {
    parent: Box<NodeContext>,
    datatype: Box<NodeContext>,
}

impl LiteralContext {
    pub(crate) fn new(parent: NodeContext, datatype: NodeContext) -> Self {
        Self {
            parent: Box::new(parent),
            datatype: Box::new(datatype),
        }
    }

    /// Context of the concept this literal is attached to.
    #[must_use]
    pub fn parent(&self) -> &NodeContext {
        &self.parent
    }

    /// Datatype context as chosen by the strategy.
    #[must_use]
    pub fn datatype(&self) -> &NodeContext {
        &self.datatype
    }
}

/// A strategy's answer for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSpec {
    /// Do not materialize this position.
    Skip,
    /// Request a fresh, build-unique context.
    Fresh,
    /// Use this context as-is.
    Context(NodeContext),
}

impl ContextSpec {
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::Context(NodeContext::Key(key.into()))
    }

    #[must_use]
    pub const fn number(n: u64) -> Self {
        Self::Context(NodeContext::Number(n))
    }

    #[must_use]
    pub const fn composite(parts: Vec<ContextPart>) -> Self {
        Self::Context(NodeContext::Composite(parts))
    }

    /// Reuse an already-resolved context.
    #[must_use]
    pub fn reuse(context: &NodeContext) -> Self {
        Self::Context(context.clone())
    }
}

/// Which kind of graph node a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Class,
    Datum,
}

/// Identity of a model node: `(context, kind, uri)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeKey<'a> {
    pub context: &'a NodeContext,
    pub kind: KeyKind,
    pub uri: &'a str,
}

impl NodeKey<'_> {
    /// Content-addressed alias for the graph store.
    ///
    /// The key is JSON-encoded, so URIs containing any delimiter cannot
    /// make two different keys collide.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn alias(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
