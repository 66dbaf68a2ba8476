//! End-to-end behaviour of the model graph builder.
//!
//! Each test builds a small pathbuilder in-test and checks one property of
//! the resulting graph: memoization, the sharing rules of each strategy,
//! edge canonicalization, omitted-node handling and deterministic output.

use std::collections::{BTreeSet, HashSet};

use pathgraph_core::graph::NodeId;
use pathgraph_core::inverse::InverseMap;
use pathgraph_core::model::strategy::{ConceptQuery, DatatypeQuery};
use pathgraph_core::model::{
    ConceptModelNode, ContextSpec, DedupOptions, DedupStrategy, Deduplication, ModelEdge,
    ModelGraph, ModelGraphBuilder, ModelGraphStats, ModelNode,
};
use pathgraph_core::pathbuilder::{PathRecord, PathTree};
use petgraph::algo::is_cyclic_directed;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn tree(paths: Vec<PathRecord>) -> PathTree {
    PathTree::from_paths(paths).expect("tree")
}

fn build(tree: &PathTree, mode: Deduplication) -> ModelGraph {
    build_with(tree, DedupOptions::default(), mode)
}

fn build_with(tree: &PathTree, options: DedupOptions<'_>, mode: Deduplication) -> ModelGraph {
    ModelGraphBuilder::new(tree, options, mode)
        .into_graph()
        .expect("build")
}

fn concepts_of<'g>(graph: &'g ModelGraph, clz: &str) -> Vec<(NodeId, &'g ConceptModelNode)> {
    graph
        .nodes()
        .into_iter()
        .filter_map(|(id, node)| node.as_concept().map(|c| (id, c)))
        .filter(|(_, c)| c.clz == clz)
        .collect()
}

/// Bundle `b` on `A -p-> B` with a field that extends it to `C` and ends in
/// a literal.
fn extended_field() -> Vec<PathRecord> {
    vec![
        PathRecord::bundle("b", &["ex:A", "ex:p", "ex:B"]),
        PathRecord::field("f", &["ex:A", "ex:p", "ex:B", "ex:q", "ex:C"], "ex:name")
            .in_group("b"),
    ]
}

// ---------------------------------------------------------------------------
// Memoization
// ---------------------------------------------------------------------------

#[test]
fn build_twice_returns_the_same_graph() {
    let tree = tree(extended_field());
    for mode in Deduplication::ALL {
        let mut builder = ModelGraphBuilder::new(&tree, DedupOptions::default(), mode);
        let first = builder.build().expect("first build");
        let (nodes, edges) = (first.node_count(), first.edge_count());
        let first: *const ModelGraph = first;

        let second = builder.build().expect("second build");
        assert!(std::ptr::eq(first, second), "{mode}: same instance");
        assert_eq!(second.node_count(), nodes);
        assert_eq!(second.edge_count(), edges);
    }
}

// ---------------------------------------------------------------------------
// None
// ---------------------------------------------------------------------------

#[test]
fn none_draws_one_node_per_concept_occurrence() {
    let paths = vec![
        PathRecord::bundle("b", &["ex:A", "ex:p", "ex:B"]),
        PathRecord::field("f1", &["ex:A", "ex:p", "ex:B", "ex:q", "ex:C"], "").in_group("b"),
        PathRecord::field("f2", &["ex:A", "ex:p", "ex:B"], "ex:name").in_group("b"),
        PathRecord::field("top", &["ex:D"], ""),
    ];
    let occurrences: usize = paths.iter().map(|p| p.concepts().count()).sum();
    let graph = build(&tree(paths), Deduplication::None);

    let stats = ModelGraphStats::of(&graph);
    assert!(graph.definitely_acyclic);
    assert_eq!(stats.concept_nodes, occurrences);
    assert_eq!(stats.literal_nodes, 1);

    let (digraph, _) = graph.to_digraph();
    assert!(!is_cyclic_directed(&digraph));
}

#[test]
fn none_counts_only_included_occurrences() {
    let paths = vec![
        PathRecord::bundle("b", &["ex:A", "ex:p", "ex:B"]),
        PathRecord::field("f1", &["ex:A", "ex:p", "ex:B", "ex:q", "ex:C"], "").in_group("b"),
        PathRecord::field("f2", &["ex:A", "ex:p", "ex:B"], "ex:name").in_group("b"),
        PathRecord::field("top", &["ex:D"], ""),
    ];
    let excluded = ["b", "f2"];
    let included: usize = paths
        .iter()
        .filter(|p| !excluded.contains(&p.id.as_str()))
        .map(|p| p.concepts().count())
        .sum();
    assert_eq!(included, 4);

    let options = DedupOptions::default().with_include(|node| !excluded.contains(&node.id()));
    let graph = build_with(&tree(paths), options, Deduplication::None);

    let stats = ModelGraphStats::of(&graph);
    assert_eq!(stats.concept_nodes, included);
    assert_eq!(stats.literal_nodes, 0);
    assert_eq!(stats.property_edges, 2);
    assert_eq!(stats.data_edges, 0);
}

// ---------------------------------------------------------------------------
// Full
// ---------------------------------------------------------------------------

#[test]
fn full_shares_a_class_across_unrelated_paths() {
    let tree = tree(vec![
        PathRecord::field("x", &["ex:A", "ex:p", "ex:C"], ""),
        PathRecord::field("y", &["ex:B", "ex:q", "ex:C"], ""),
    ]);

    let full = build(&tree, Deduplication::Full);
    let shared = concepts_of(&full, "ex:C");
    assert_eq!(shared.len(), 1);
    assert_eq!(
        shared[0].1.fields,
        BTreeSet::from(["x".to_string(), "y".to_string()])
    );
    assert!(!full.definitely_acyclic);

    let none = build(&tree, Deduplication::None);
    assert_eq!(concepts_of(&none, "ex:C").len(), 2);
}

#[test]
fn full_draws_converging_siblings_once() {
    let tree = tree(vec![
        PathRecord::bundle("b", &["ex:A"]),
        PathRecord::field("f1", &["ex:A", "ex:p", "ex:B"], "").in_group("b"),
        PathRecord::field("f2", &["ex:A", "ex:p", "ex:B"], "").in_group("b"),
    ]);
    let graph = build(&tree, Deduplication::Full);

    let properties: Vec<_> = graph
        .edges()
        .into_iter()
        .filter(|e| e.label.property() == "ex:p")
        .collect();
    assert_eq!(properties.len(), 1);
    assert_eq!(graph.node_count(), 2);
}

// ---------------------------------------------------------------------------
// Parents
// ---------------------------------------------------------------------------

#[test]
fn parents_shares_the_prefix_with_the_bundle() {
    let tree = tree(extended_field());

    let parents = build(&tree, Deduplication::Parents);
    assert_eq!(parents.node_count(), 4);
    let b = concepts_of(&parents, "ex:B");
    assert_eq!(b.len(), 1);
    assert!(b[0].1.bundles.contains("b"));
    assert_eq!(parents.edge_count(), 3, "A->B is drawn once");
    assert!(parents.definitely_acyclic);

    let none = build(&tree, Deduplication::None);
    assert_eq!(none.node_count(), 6);
    assert_eq!(concepts_of(&none, "ex:B").len(), 2);
}

#[test]
fn parents_does_not_share_past_a_divergence() {
    let tree = tree(vec![
        PathRecord::bundle("b", &["ex:A", "ex:p", "ex:B"]),
        PathRecord::field("f", &["ex:A", "ex:r", "ex:B"], "").in_group("b"),
    ]);
    let graph = build(&tree, Deduplication::Parents);
    assert_eq!(concepts_of(&graph, "ex:A").len(), 1);
    assert_eq!(concepts_of(&graph, "ex:B").len(), 2);
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

#[test]
fn bundle_shares_within_a_bundle_only() {
    let tree = tree(vec![
        PathRecord::bundle("b1", &["ex:A"]),
        PathRecord::field("f1", &["ex:A", "ex:p", "ex:C"], "").in_group("b1"),
        PathRecord::field("f2", &["ex:A", "ex:p", "ex:C"], "").in_group("b1"),
        PathRecord::bundle("b2", &["ex:A"]),
        PathRecord::field("f3", &["ex:A", "ex:p", "ex:C"], "").in_group("b2"),
    ]);
    let graph = build(&tree, Deduplication::Bundle);

    assert_eq!(concepts_of(&graph, "ex:A").len(), 2);
    let c = concepts_of(&graph, "ex:C");
    assert_eq!(c.len(), 2);
    assert!(c.iter().any(|(_, n)| n.fields.len() == 2));
    assert_eq!(graph.edge_count(), 2);
}

// ---------------------------------------------------------------------------
// Inverses
// ---------------------------------------------------------------------------

#[test]
fn inverse_property_is_canonicalized_and_swapped() {
    let tree = tree(vec![PathRecord::field("f", &["ex:A", "ex:childOf", "ex:B"], "")]);
    let inverses: InverseMap = [("ex:parentOf", "ex:childOf")].into_iter().collect();
    let graph = build_with(&tree, DedupOptions::new(inverses), Deduplication::None);

    let a = concepts_of(&graph, "ex:A")[0].0;
    let b = concepts_of(&graph, "ex:B")[0].0;
    let edges = graph.edges();
    assert_eq!(edges.len(), 1);
    let edge = edges[0];
    let ModelEdge::Property(label) = edge.label else {
        panic!("expected a property edge, got {:?}", edge.label);
    };
    assert_eq!(label.property, "ex:parentOf");
    assert_eq!(label.inverse_property.as_deref(), Some("ex:childOf"));
    assert_eq!((edge.from, edge.to), (b, a));
}

#[test]
fn canonical_property_keeps_direction() {
    let tree = tree(vec![PathRecord::field("f", &["ex:A", "ex:parentOf", "ex:B"], "")]);
    let inverses: InverseMap = [("ex:parentOf", "ex:childOf")].into_iter().collect();
    let graph = build_with(&tree, DedupOptions::new(inverses), Deduplication::None);

    let a = concepts_of(&graph, "ex:A")[0].0;
    let edge = graph.edges()[0];
    assert_eq!(edge.from, a);
    assert_eq!(edge.label.inverse_property(), Some("ex:childOf"));
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

#[test]
fn no_two_edges_share_an_ordered_pair() {
    let tree = tree(vec![
        PathRecord::bundle("b", &["ex:A"]),
        PathRecord::field("f1", &["ex:A", "ex:p", "ex:B"], "ex:name").in_group("b"),
        PathRecord::field("f2", &["ex:A", "ex:p", "ex:B"], "ex:name").in_group("b"),
        PathRecord::field("f3", &["ex:A", "ex:p", "ex:B", "ex:p", "ex:A"], "").in_group("b"),
    ]);
    for mode in Deduplication::ALL {
        let graph = build(&tree, mode);
        let edges = graph.edges();
        let pairs: HashSet<_> = edges.iter().map(|e| (e.from, e.to)).collect();
        assert_eq!(pairs.len(), edges.len(), "{mode}");
    }
}

// ---------------------------------------------------------------------------
// Omitted nodes
// ---------------------------------------------------------------------------

#[test]
fn omitted_bundle_still_hands_contexts_to_children() {
    let tree = tree(extended_field());
    let options = DedupOptions::default().with_include(|node| node.id() != "b");
    let graph = build_with(&tree, options, Deduplication::Parents);

    // A and B come from the field alone, C is fresh, plus one literal.
    let stats = ModelGraphStats::of(&graph);
    assert_eq!(stats.concept_nodes, 3);
    assert_eq!(stats.literal_nodes, 1);
    assert_eq!(stats.property_edges, 2);
    assert_eq!(stats.data_edges, 1);
    assert!(
        graph
            .nodes()
            .into_iter()
            .filter_map(|(_, n)| n.as_concept())
            .all(|c| c.bundles.is_empty()),
        "the excluded bundle is attached nowhere"
    );

    let literal = graph
        .nodes()
        .into_iter()
        .find_map(|(_, n)| match n {
            ModelNode::Literal(l) => Some(l.clone()),
            ModelNode::Concept(_) => None,
        })
        .expect("literal");
    assert!(literal.fields.contains("f"));
}

#[test]
fn omitting_everything_yields_an_empty_graph() {
    let tree = tree(extended_field());
    let options = DedupOptions::default().with_include(|_| false);
    let graph = build_with(&tree, options, Deduplication::Full);
    assert!(graph.is_empty());
}

// ---------------------------------------------------------------------------
// Custom strategies
// ---------------------------------------------------------------------------

/// Leaves the first concept of every path undrawn.
struct SkipFirstConcept;

impl DedupStrategy for SkipFirstConcept {
    fn name(&self) -> &'static str {
        "skip-first"
    }

    fn concept_context(&self, query: &ConceptQuery<'_>) -> ContextSpec {
        if query.element.index == 0 {
            ContextSpec::Skip
        } else {
            ContextSpec::Fresh
        }
    }

    fn datatype_context(&self, _query: &DatatypeQuery<'_>) -> ContextSpec {
        ContextSpec::Fresh
    }

    fn definitely_acyclic(&self) -> bool {
        true
    }
}

#[test]
fn skipped_concepts_drop_their_edges_and_literals() {
    let tree = tree(vec![
        PathRecord::field("lit", &["ex:A"], "ex:name"),
        PathRecord::field("rel", &["ex:A", "ex:p", "ex:B"], ""),
    ]);
    let mut builder = ModelGraphBuilder::with_strategy(
        &tree,
        DedupOptions::default(),
        Box::new(SkipFirstConcept),
    );
    assert_eq!(builder.strategy_name(), "skip-first");

    let graph = builder.build().expect("build");
    assert!(graph.definitely_acyclic);

    let stats = ModelGraphStats::of(graph);
    assert_eq!(stats.concept_nodes, 1);
    assert_eq!(stats.literal_nodes, 0);
    assert_eq!(stats.property_edges, 0);
    assert_eq!(stats.data_edges, 0);

    assert!(concepts_of(graph, "ex:A").is_empty());
    let b = concepts_of(graph, "ex:B");
    assert_eq!(b.len(), 1);
    assert_eq!(b[0].1.fields, BTreeSet::from(["rel".to_string()]));
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn json_is_deterministic_across_builds() {
    let paths = vec![
        PathRecord::bundle("b", &["ex:A", "ex:p", "ex:B"]),
        PathRecord::field("f1", &["ex:A", "ex:p", "ex:B", "ex:q", "ex:C"], "ex:name")
            .in_group("b"),
        PathRecord::field("f2", &["ex:A", "ex:p", "ex:B"], "ex:label").in_group("b"),
        PathRecord::field("top", &["ex:C", "ex:childOf", "ex:A"], ""),
    ];
    for mode in Deduplication::ALL {
        let inverses = || [("ex:parentOf", "ex:childOf")].into_iter().collect::<InverseMap>();
        let t1 = tree(paths.clone());
        let t2 = tree(paths.clone());
        let g1 = build_with(&t1, DedupOptions::new(inverses()), mode);
        let g2 = build_with(&t2, DedupOptions::new(inverses()), mode);
        assert_eq!(g1.to_json().expect("json"), g2.to_json().expect("json"), "{mode}");
        assert_eq!(g1.content_hash().expect("hash"), g2.content_hash().expect("hash"));
    }
}

#[test]
fn json_shape_matches_the_store_layout() {
    let tree = tree(vec![PathRecord::field("f", &["ex:A"], "ex:name")]);
    let json = build(&tree, Deduplication::None).to_json().expect("json");

    let nodes = json["nodes"].as_array().expect("nodes");
    let edges = json["edges"].as_array().expect("edges");
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0][0], 0);
    assert_eq!(nodes[0][1]["type"], "concept");
    assert_eq!(nodes[1][1]["type"], "literal");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0][1], 0);
    assert_eq!(edges[0][2], 1);
    assert_eq!(edges[0][3]["type"], "data");
    assert_eq!(edges[0][3]["property"], "ex:name");
}
