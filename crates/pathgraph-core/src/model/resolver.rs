//! Node context resolution: the single tree walk that populates a
//! [`ModelGraph`].
//!
//! # Algorithm
//!
//! For every bundle and field, in pre-order:
//!
//! 1. Look up the contexts the parent resolved for each element position.
//! 2. Ask the strategy for a context for every concept element. Unless the
//!    answer is [`ContextSpec::Skip`] or the node is omitted, draw (or
//!    reuse) the class node keyed by `(context, class, uri)`.
//! 3. Draw a property edge for every relation property whose neighbouring
//!    concepts were both drawn, after canonicalizing it through the
//!    [`InverseMap`](crate::inverse::InverseMap).
//! 4. For a field with a datatype property, draw the literal keyed by
//!    `(literal context, datum, uri)` and the data edge leading to it.
//! 5. Otherwise record the bundle or field on the last drawn concept.
//! 6. Keep this node's contexts for its children.
//!
//! Omitted nodes go through steps 1, 2 and 6 only: they get contexts so
//! their descendants can inherit them, but no node or edge of their own.
//!
//! Input anomalies are logged and the affected item skipped. Broken
//! internal invariants surface as [`BuildError`].

use std::collections::{HashMap, HashSet};

use tracing::{trace, warn};

use super::context::{ContextSpec, KeyKind, LiteralContext, NodeContext, NodeKey};
use super::strategy::{ConceptQuery, DatatypeQuery, DedupStrategy};
use super::{
    BuildError, ConceptModelNode, DataModelEdge, LiteralModelNode, ModelEdge, ModelGraph,
    ModelNode, PropertyModelEdge,
};
use crate::graph::NodeId;
use crate::inverse::InverseMap;
use crate::pathbuilder::{NodeKind, PathElement, PathTree, PropertyRole, TreeIndex, TreeNode};

/// Per-node resolution results, indexed like the node's elements.
#[derive(Debug, Clone, Default)]
struct Positions {
    contexts: Vec<Option<NodeContext>>,
    drawn: Vec<Option<NodeId>>,
}

impl Positions {
    fn with_len(len: usize) -> Self {
        Self {
            contexts: vec![None; len],
            drawn: vec![None; len],
        }
    }

    fn drawn_at(&self, index: usize) -> Option<NodeId> {
        self.drawn.get(index).copied().flatten()
    }

    fn last_drawn(&self) -> Option<NodeId> {
        self.drawn.iter().rev().find_map(|d| *d)
    }
}

/// Walks a [`PathTree`] once and writes the deduplicated model into a graph.
///
/// All mutable state (fresh-context counter, edge trackers, per-node
/// contexts) lives here and dies with the resolver.
pub struct NodeContextResolver<'a> {
    tree: &'a PathTree,
    strategy: &'a dyn DedupStrategy,
    inverses: &'a InverseMap,
    include: &'a dyn Fn(&TreeNode) -> bool,
    graph: &'a mut ModelGraph,

    next_context: u64,
    contexts: HashMap<TreeIndex, Vec<Option<NodeContext>>>,
    property_edges: HashSet<(NodeId, NodeId, String)>,
    data_edges: HashSet<(NodeId, NodeId)>,
}

impl<'a> NodeContextResolver<'a> {
    pub fn new(
        tree: &'a PathTree,
        strategy: &'a dyn DedupStrategy,
        inverses: &'a InverseMap,
        include: &'a dyn Fn(&TreeNode) -> bool,
        graph: &'a mut ModelGraph,
    ) -> Self {
        Self {
            tree,
            strategy,
            inverses,
            include,
            graph,
            next_context: 0,
            contexts: HashMap::new(),
            property_edges: HashSet::new(),
            data_edges: HashSet::new(),
        }
    }

    /// Walk the whole tree.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if an internal invariant breaks; the graph
    /// is then partially populated and should be discarded.
    pub fn run(mut self) -> Result<(), BuildError> {
        let tree = self.tree;
        for node in tree.walk() {
            self.visit(node)?;
        }
        Ok(())
    }

    fn visit(&mut self, node: &TreeNode) -> Result<(), BuildError> {
        let omitted = !(self.include)(node);
        let elements = self.tree.elements(node);
        trace!(path_id = node.id(), omitted, elements = elements.len(), "visiting");

        let parent_contexts = node
            .parent()
            .and_then(|p| self.contexts.get(&p))
            .cloned()
            .unwrap_or_default();

        let mut positions = Positions::with_len(elements.len());
        self.resolve_concepts(node, &elements, omitted, &parent_contexts, &mut positions)?;

        if !omitted {
            self.draw_properties(node, &elements, &positions)?;

            let datatype_field =
                node.kind() == NodeKind::Field && node.path().has_datatype_property();
            if datatype_field {
                self.draw_datatype(node, &elements, &positions)?;
            } else {
                self.annotate_last_concept(node, &positions)?;
            }
        }

        if !node.children().is_empty() {
            self.contexts.insert(node.index(), positions.contexts);
        }
        Ok(())
    }

    fn resolve(&mut self, spec: ContextSpec) -> Option<NodeContext> {
        match spec {
            ContextSpec::Skip => None,
            ContextSpec::Fresh => {
                self.next_context += 1;
                Some(NodeContext::Number(self.next_context))
            }
            ContextSpec::Context(context) => Some(context),
        }
    }

    // -- step 2 -------------------------------------------------------------

    fn resolve_concepts(
        &mut self,
        node: &TreeNode,
        elements: &[PathElement],
        omitted: bool,
        parent_contexts: &[Option<NodeContext>],
        positions: &mut Positions,
    ) -> Result<(), BuildError> {
        let mut previous: Option<NodeContext> = None;

        for element in elements.iter().filter(|e| e.is_concept()) {
            let spec = self.strategy.concept_context(&ConceptQuery {
                tree: self.tree,
                node,
                element,
                elements,
                omitted,
                previous: previous.as_ref(),
                parent: parent_contexts.get(element.index).and_then(Option::as_ref),
            });
            let Some(context) = self.resolve(spec) else {
                continue;
            };

            if !omitted {
                let id = self.draw_concept(&context, &element.uri)?;
                positions.drawn[element.index] = Some(id);
            }
            positions.contexts[element.index] = Some(context.clone());
            previous = Some(context);
        }
        Ok(())
    }

    fn draw_concept(&mut self, context: &NodeContext, uri: &str) -> Result<NodeId, BuildError> {
        let alias = NodeKey {
            context,
            kind: KeyKind::Class,
            uri,
        }
        .alias()?;

        self.graph.try_add_or_update_node(&alias, |old| match old {
            None => Ok(ModelNode::Concept(ConceptModelNode::new(uri))),
            Some(ModelNode::Concept(existing)) => Ok(ModelNode::Concept(existing.clone())),
            Some(other @ ModelNode::Literal(_)) => Err(BuildError::NodeKindMismatch {
                alias: alias.clone(),
                expected: "concept",
                found: other.kind_name(),
            }),
        })
    }

    // -- step 3 -------------------------------------------------------------

    fn draw_properties(
        &mut self,
        node: &TreeNode,
        elements: &[PathElement],
        positions: &Positions,
    ) -> Result<(), BuildError> {
        let relations = elements
            .iter()
            .filter(|e| e.role() == Some(PropertyRole::Relation));

        for element in relations {
            if element.index + 1 >= elements.len() {
                warn!(
                    path_id = node.id(),
                    uri = %element.uri,
                    index = element.index,
                    "property has no following concept; skipping edge"
                );
                continue;
            }
            let (Some(source), Some(target)) = (
                positions.drawn_at(element.index - 1),
                positions.drawn_at(element.index + 1),
            ) else {
                continue;
            };

            let edge = self.inverses.canonicalize_edge(&element.uri, source, target);
            if !self
                .property_edges
                .insert((edge.source, edge.target, edge.uri.clone()))
            {
                continue;
            }

            let label = ModelEdge::Property(PropertyModelEdge {
                property: edge.uri,
                inverse_property: edge.inverse,
            });
            self.add_edge(edge.source, edge.target, label)?;
        }
        Ok(())
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, label: ModelEdge) -> Result<(), BuildError> {
        let property = label.property().to_string();
        if self.graph.add_edge(from, to, label) {
            Ok(())
        } else {
            Err(BuildError::EdgeRejected {
                property,
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    // -- step 4 -------------------------------------------------------------

    fn draw_datatype(
        &mut self,
        node: &TreeNode,
        elements: &[PathElement],
        positions: &Positions,
    ) -> Result<(), BuildError> {
        let Some(element) = elements
            .iter()
            .find(|e| e.role() == Some(PropertyRole::Datatype))
        else {
            warn!(
                path_id = node.id(),
                datatype_property = %node.path().datatype_property,
                "field declares a datatype property but its path has no datatype element"
            );
            return Ok(());
        };

        let concept_index = element.index.checked_sub(1);
        let concept = concept_index.and_then(|i| {
            Some((positions.drawn_at(i)?, positions.contexts.get(i)?.as_ref()?))
        });
        let Some((concept_node, concept_context)) = concept else {
            warn!(
                path_id = node.id(),
                uri = %element.uri,
                "concept before the datatype property was not drawn; skipping literal"
            );
            return Ok(());
        };

        let spec = self.strategy.datatype_context(&DatatypeQuery {
            tree: self.tree,
            node,
            element,
            elements,
            omitted: false,
            concept: concept_context,
        });
        let Some(datatype_context) = self.resolve(spec) else {
            return Ok(());
        };

        let context = NodeContext::Literal(LiteralContext::new(
            concept_context.clone(),
            datatype_context,
        ));
        let alias = NodeKey {
            context: &context,
            kind: KeyKind::Datum,
            uri: &element.uri,
        }
        .alias()?;

        let field_id = node.id();
        let literal = self.graph.try_add_or_update_node(&alias, |old| match old {
            None => {
                let mut literal = LiteralModelNode::default();
                literal.fields.insert(field_id.to_string());
                Ok(ModelNode::Literal(literal))
            }
            Some(ModelNode::Literal(existing)) => {
                let mut literal = existing.clone();
                literal.fields.insert(field_id.to_string());
                Ok(ModelNode::Literal(literal))
            }
            Some(other @ ModelNode::Concept(_)) => Err(BuildError::NodeKindMismatch {
                alias: alias.clone(),
                expected: "literal",
                found: other.kind_name(),
            }),
        })?;

        let edge = self
            .inverses
            .canonicalize_edge(&element.uri, concept_node, literal);
        if !self.data_edges.insert((edge.source, edge.target)) {
            return Ok(());
        }
        let label = ModelEdge::Data(DataModelEdge {
            property: edge.uri,
            inverse_property: edge.inverse,
        });
        self.add_edge(edge.source, edge.target, label)
    }

    // -- step 5 -------------------------------------------------------------

    fn annotate_last_concept(
        &mut self,
        node: &TreeNode,
        positions: &Positions,
    ) -> Result<(), BuildError> {
        let Some(target) = positions.last_drawn() else {
            warn!(path_id = node.id(), "no concept drawn for path; nothing to annotate");
            return Ok(());
        };

        let path_id = node.id();
        let kind = node.kind();
        self.graph.try_add_or_update_node(target, |old| match old {
            Some(ModelNode::Concept(existing)) => {
                let mut concept = existing.clone();
                match kind {
                    NodeKind::Bundle => concept.bundles.insert(path_id.to_string()),
                    NodeKind::Field => concept.fields.insert(path_id.to_string()),
                };
                Ok(ModelNode::Concept(concept))
            }
            Some(other @ ModelNode::Literal(_)) => Err(BuildError::NodeKindMismatch {
                alias: target.to_string(),
                expected: "concept",
                found: other.kind_name(),
            }),
            None => Err(BuildError::Graph(crate::graph::GraphError::UnknownNode(target))),
        })?;
        Ok(())
    }
}
