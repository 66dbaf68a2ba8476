//! Generic directed graph store.
//!
//! # Identity
//!
//! Every node gets a monotonically increasing [`NodeId`]. A node may also
//! carry a caller-chosen string alias; the alias ↔ id mapping is kept
//! bijective. Every operation that accepts a node reference accepts either
//! form through [`NodeRef`].
//!
//! # Edges
//!
//! An edge is identified by its ordered `(from, to)` pair. Adding an edge
//! for a pair that already exists overwrites the label in place (keeping
//! the original [`EdgeId`] and position) instead of creating a parallel
//! edge.
//!
//! # Ordering
//!
//! [`Graph::nodes`], [`Graph::edges`] and the serialized form all follow
//! insertion order, so two graphs built by the same sequence of calls
//! serialize identically.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::warn;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Numeric node identifier, assigned in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// The raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric edge identifier, assigned in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct EdgeId(u64);

impl EdgeId {
    /// The raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A reference to a node: either its numeric id or its string alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    Id(NodeId),
    Alias(&'a str),
}

impl From<NodeId> for NodeRef<'_> {
    fn from(id: NodeId) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a str> for NodeRef<'a> {
    fn from(alias: &'a str) -> Self {
        Self::Alias(alias)
    }
}

impl<'a> From<&'a String> for NodeRef<'a> {
    fn from(alias: &'a String) -> Self {
        Self::Alias(alias.as_str())
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Alias(alias) => write!(f, "{alias:?}"),
        }
    }
}

/// Errors raised by [`Graph`] mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A numeric id was given for a node that does not exist. New nodes can
    /// only be created under a fresh id or a string alias.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    /// The alias is already bound to another node.
    #[error("alias {alias:?} is already bound to node {existing}")]
    DuplicateAlias { alias: String, existing: NodeId },
}

impl GraphError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> crate::error::ErrorCode {
        match self {
            Self::UnknownNode(_) => crate::error::ErrorCode::UnknownNode,
            Self::DuplicateAlias { .. } => crate::error::ErrorCode::DuplicateAlias,
        }
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct NodeEntry<N> {
    label: N,
    alias: Option<String>,
}

#[derive(Debug, Clone)]
struct EdgeEntry<E> {
    from: NodeId,
    to: NodeId,
    label: E,
}

/// A borrowed view of one edge, as returned by [`Graph::edges`].
#[derive(Debug, PartialEq, Eq)]
pub struct EdgeView<'g, E> {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub label: &'g E,
}

// Manual impls: the view only holds `&E`, so it is `Copy` for any `E`.
impl<E> Clone for EdgeView<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EdgeView<'_, E> {}

/// A directed graph with labelled nodes and at most one labelled edge per
/// ordered node pair.
#[derive(Debug, Clone)]
pub struct Graph<N, E> {
    nodes: BTreeMap<NodeId, NodeEntry<N>>,
    aliases: HashMap<String, NodeId>,
    edges: BTreeMap<EdgeId, EdgeEntry<E>>,
    edge_index: HashMap<(NodeId, NodeId), EdgeId>,
    next_node: u64,
    next_edge: u64,
    /// Hint from whoever populated the graph that it contains no directed
    /// cycle. Layout code may rely on it; the store never checks it.
    pub definitely_acyclic: bool,
}

impl<N, E> Default for Graph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Graph<N, E> {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            aliases: HashMap::new(),
            edges: BTreeMap::new(),
            edge_index: HashMap::new(),
            next_node: 0,
            next_edge: 0,
            definitely_acyclic: false,
        }
    }

    /// Create an empty graph carrying the given acyclicity hint.
    #[must_use]
    pub fn with_acyclic_hint(definitely_acyclic: bool) -> Self {
        Self {
            definitely_acyclic,
            ..Self::new()
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the graph has neither nodes nor edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    // -- nodes --------------------------------------------------------------

    fn allocate_node(&mut self, label: N, alias: Option<String>) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        if let Some(alias) = &alias {
            self.aliases.insert(alias.clone(), id);
        }
        self.nodes.insert(id, NodeEntry { label, alias });
        id
    }

    /// Add a node without an alias and return its id.
    pub fn add_node(&mut self, label: N) -> NodeId {
        self.allocate_node(label, None)
    }

    /// Add a node bound to `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateAlias`] if `alias` already names a node.
    pub fn add_node_with_alias(&mut self, label: N, alias: &str) -> Result<NodeId, GraphError> {
        if let Some(&existing) = self.aliases.get(alias) {
            return Err(GraphError::DuplicateAlias {
                alias: alias.to_string(),
                existing,
            });
        }
        Ok(self.allocate_node(label, Some(alias.to_string())))
    }

    /// Create the node if it is absent, otherwise replace its label with
    /// `update(Some(old))` while keeping its id.
    ///
    /// This is the merge primitive used for deduplication: callers address
    /// nodes by a content-derived alias and fold new information into
    /// whatever label is already there.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `node` is a numeric id that
    /// does not exist (fresh nodes need an alias).
    pub fn add_or_update_node<'r>(
        &mut self,
        node: impl Into<NodeRef<'r>>,
        update: impl FnOnce(Option<&N>) -> N,
    ) -> Result<NodeId, GraphError> {
        self.try_add_or_update_node(node, |old| Ok::<_, GraphError>(update(old)))
    }

    /// Fallible form of [`Graph::add_or_update_node`].
    ///
    /// If `update` fails the graph is left untouched.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `update`, or a [`GraphError`]
    /// converted into `Err` for an unknown numeric id.
    pub fn try_add_or_update_node<'r, Err>(
        &mut self,
        node: impl Into<NodeRef<'r>>,
        update: impl FnOnce(Option<&N>) -> Result<N, Err>,
    ) -> Result<NodeId, Err>
    where
        Err: From<GraphError>,
    {
        let node = node.into();
        match self.resolve(node) {
            Some(id) => {
                let entry = self
                    .nodes
                    .get_mut(&id)
                    .ok_or(GraphError::UnknownNode(id))?;
                entry.label = update(Some(&entry.label))?;
                Ok(id)
            }
            None => match node {
                NodeRef::Id(id) => Err(GraphError::UnknownNode(id).into()),
                NodeRef::Alias(alias) => {
                    let label = update(None)?;
                    Ok(self.allocate_node(label, Some(alias.to_string())))
                }
            },
        }
    }

    /// Resolve a node reference to its id, if the node exists.
    #[must_use]
    pub fn resolve<'r>(&self, node: impl Into<NodeRef<'r>>) -> Option<NodeId> {
        match node.into() {
            NodeRef::Id(id) => self.nodes.contains_key(&id).then_some(id),
            NodeRef::Alias(alias) => self.aliases.get(alias).copied(),
        }
    }

    /// Returns `true` if the referenced node exists.
    #[must_use]
    pub fn has_node<'r>(&self, node: impl Into<NodeRef<'r>>) -> bool {
        self.resolve(node).is_some()
    }

    /// Return the id and label of the referenced node.
    #[must_use]
    pub fn node<'r>(&self, node: impl Into<NodeRef<'r>>) -> Option<(NodeId, &N)> {
        let id = self.resolve(node)?;
        self.nodes.get(&id).map(|entry| (id, &entry.label))
    }

    /// Return the label of the referenced node.
    #[must_use]
    pub fn node_label<'r>(&self, node: impl Into<NodeRef<'r>>) -> Option<&N> {
        self.node(node).map(|(_, label)| label)
    }

    /// Return the alias bound to a node, if any.
    #[must_use]
    pub fn node_alias<'r>(&self, node: impl Into<NodeRef<'r>>) -> Option<&str> {
        let id = self.resolve(node)?;
        self.nodes.get(&id).and_then(|entry| entry.alias.as_deref())
    }

    /// Stable string name for a node: its alias if it has one, else its
    /// numeric id rendered as a string.
    #[must_use]
    pub fn node_string<'r>(&self, node: impl Into<NodeRef<'r>>) -> Option<String> {
        let id = self.resolve(node)?;
        let entry = self.nodes.get(&id)?;
        Some(entry.alias.clone().unwrap_or_else(|| id.to_string()))
    }

    /// Delete a node, its alias, and every edge touching it.
    ///
    /// Returns `false` if the node did not exist.
    pub fn delete_node<'r>(&mut self, node: impl Into<NodeRef<'r>>) -> bool {
        let Some(id) = self.resolve(node) else {
            return false;
        };
        if let Some(entry) = self.nodes.remove(&id)
            && let Some(alias) = entry.alias
        {
            self.aliases.remove(&alias);
        }

        let incident: Vec<(NodeId, NodeId)> = self
            .edge_index
            .keys()
            .filter(|(from, to)| *from == id || *to == id)
            .copied()
            .collect();
        for pair in incident {
            if let Some(edge_id) = self.edge_index.remove(&pair) {
                self.edges.remove(&edge_id);
            }
        }
        true
    }

    /// Snapshot of all nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> Vec<(NodeId, &N)> {
        self.nodes
            .iter()
            .map(|(id, entry)| (*id, &entry.label))
            .collect()
    }

    // -- edges --------------------------------------------------------------

    /// Add an edge `from → to`, overwriting the label if the pair is
    /// already connected.
    ///
    /// Returns `false` (and logs) if either endpoint does not exist.
    pub fn add_edge<'a, 'b>(
        &mut self,
        from: impl Into<NodeRef<'a>>,
        to: impl Into<NodeRef<'b>>,
        label: E,
    ) -> bool {
        let (from, to) = (from.into(), to.into());
        let (Some(from_id), Some(to_id)) = (self.resolve(from), self.resolve(to)) else {
            warn!(%from, %to, "refusing edge with a missing endpoint");
            return false;
        };

        if let Some(edge_id) = self.edge_index.get(&(from_id, to_id))
            && let Some(entry) = self.edges.get_mut(edge_id)
        {
            entry.label = label;
            return true;
        }

        let edge_id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edge_index.insert((from_id, to_id), edge_id);
        self.edges.insert(
            edge_id,
            EdgeEntry {
                from: from_id,
                to: to_id,
                label,
            },
        );
        true
    }

    fn edge_id<'a, 'b>(
        &self,
        from: impl Into<NodeRef<'a>>,
        to: impl Into<NodeRef<'b>>,
    ) -> Option<EdgeId> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        self.edge_index.get(&(from, to)).copied()
    }

    /// Returns `true` if an edge `from → to` exists.
    #[must_use]
    pub fn has_edge<'a, 'b>(
        &self,
        from: impl Into<NodeRef<'a>>,
        to: impl Into<NodeRef<'b>>,
    ) -> bool {
        self.edge_id(from, to).is_some()
    }

    /// Return the label of the edge `from → to`.
    #[must_use]
    pub fn edge_label<'a, 'b>(
        &self,
        from: impl Into<NodeRef<'a>>,
        to: impl Into<NodeRef<'b>>,
    ) -> Option<&E> {
        let id = self.edge_id(from, to)?;
        self.edges.get(&id).map(|entry| &entry.label)
    }

    /// Delete the edge `from → to`. Returns `false` if there was none.
    pub fn delete_edge<'a, 'b>(
        &mut self,
        from: impl Into<NodeRef<'a>>,
        to: impl Into<NodeRef<'b>>,
    ) -> bool {
        let (Some(from), Some(to)) = (self.resolve(from), self.resolve(to)) else {
            return false;
        };
        match self.edge_index.remove(&(from, to)) {
            Some(edge_id) => self.edges.remove(&edge_id).is_some(),
            None => false,
        }
    }

    /// Snapshot of all edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeView<'_, E>> {
        self.edges
            .iter()
            .map(|(id, entry)| EdgeView {
                id: *id,
                from: entry.from,
                to: entry.to,
                label: &entry.label,
            })
            .collect()
    }

    // -- export -------------------------------------------------------------

    /// Export the topology as a petgraph [`DiGraph`] whose node weights are
    /// store ids and whose edge weights are edge ids.
    ///
    /// Useful for running petgraph algorithms (cycle detection, toposort)
    /// against the [`Graph::definitely_acyclic`] hint.
    #[must_use]
    pub fn to_digraph(&self) -> (DiGraph<NodeId, EdgeId>, HashMap<NodeId, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut index = HashMap::with_capacity(self.nodes.len());
        for id in self.nodes.keys() {
            index.insert(*id, graph.add_node(*id));
        }
        for (edge_id, entry) in &self.edges {
            if let (Some(&a), Some(&b)) = (index.get(&entry.from), index.get(&entry.to)) {
                graph.add_edge(a, b, *edge_id);
            }
        }
        (graph, index)
    }
}

impl<N: Serialize, E: Serialize> Graph<N, E> {
    /// Structural JSON form:
    /// `{ "nodes": [[id, label], ...], "edges": [[id, from, to, label], ...] }`.
    ///
    /// # Errors
    ///
    /// Returns an error if a label fails to serialize.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// BLAKE3 digest of the JSON form, for cheap snapshot comparison.
    ///
    /// # Errors
    ///
    /// Returns an error if a label fails to serialize.
    pub fn content_hash(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("blake3:{}", blake3::hash(&bytes)))
    }
}

impl<N: Serialize, E: Serialize> Serialize for Graph<N, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nodes: Vec<(NodeId, &N)> = self.nodes();
        let edges: Vec<(EdgeId, NodeId, NodeId, &E)> = self
            .edges
            .iter()
            .map(|(id, entry)| (*id, entry.from, entry.to, &entry.label))
            .collect();

        let mut state = serializer.serialize_struct("Graph", 2)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("edges", &edges)?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
