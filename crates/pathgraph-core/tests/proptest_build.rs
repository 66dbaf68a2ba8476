use std::collections::HashSet;

use pathgraph_core::inverse::InverseMap;
use pathgraph_core::model::{
    DedupOptions, Deduplication, ModelGraph, ModelGraphBuilder, ModelGraphStats,
};
use pathgraph_core::pathbuilder::{PathRecord, PathTree};
use petgraph::algo::is_cyclic_directed;
use proptest::prelude::*;

use generators::*;

fn build(paths: &[PathRecord], mode: Deduplication, inverses: InverseMap) -> ModelGraph {
    let tree = PathTree::from_paths(paths.to_vec()).expect("generated ids are unique");
    ModelGraphBuilder::new(&tree, DedupOptions::new(inverses), mode)
        .into_graph()
        .expect("build")
}

fn arb_mode() -> impl Strategy<Value = Deduplication> {
    prop::sample::select(Deduplication::ALL.to_vec())
}

fn parent_of_child() -> InverseMap {
    [("ex:parentOf", "ex:childOf")].into_iter().collect()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn build_is_idempotent(paths in arb_pathbuilder(), mode in arb_mode()) {
        let tree = PathTree::from_paths(paths).expect("tree");
        let mut builder =
            ModelGraphBuilder::new(&tree, DedupOptions::new(parent_of_child()), mode);
        let first = builder.build().expect("build");
        let counts = (first.node_count(), first.edge_count());
        let first: *const ModelGraph = first;
        let second = builder.build().expect("build");
        prop_assert!(std::ptr::eq(first, second));
        prop_assert_eq!((second.node_count(), second.edge_count()), counts);
    }

    #[test]
    fn none_unfolds_every_concept(paths in arb_pathbuilder()) {
        let occurrences: usize = paths.iter().map(|p| p.concepts().count()).sum();
        let graph = build(&paths, Deduplication::None, parent_of_child());
        let stats = ModelGraphStats::of(&graph);

        prop_assert!(graph.definitely_acyclic);
        prop_assert_eq!(stats.concept_nodes, occurrences);
        let (digraph, _) = graph.to_digraph();
        prop_assert!(!is_cyclic_directed(&digraph));
    }

    #[test]
    fn none_unfolds_only_included_concepts(
        paths in arb_pathbuilder(),
        mask in prop::collection::vec(any::<bool>(), 1..16),
    ) {
        let excluded: HashSet<&str> = paths
            .iter()
            .zip(mask.iter().cycle())
            .filter(|(_, skip)| **skip)
            .map(|(p, _)| p.id.as_str())
            .collect();
        let occurrences: usize = paths
            .iter()
            .filter(|p| !excluded.contains(p.id.as_str()))
            .map(|p| p.concepts().count())
            .sum();

        let tree = PathTree::from_paths(paths.clone()).expect("tree");
        let options = DedupOptions::new(parent_of_child())
            .with_include(|node| !excluded.contains(node.id()));
        let graph = ModelGraphBuilder::new(&tree, options, Deduplication::None)
            .into_graph()
            .expect("build");
        prop_assert_eq!(ModelGraphStats::of(&graph).concept_nodes, occurrences);
    }

    #[test]
    fn parents_without_inverses_is_acyclic(paths in arb_pathbuilder()) {
        let graph = build(&paths, Deduplication::Parents, InverseMap::new());
        prop_assert!(graph.definitely_acyclic);
        let (digraph, _) = graph.to_digraph();
        prop_assert!(!is_cyclic_directed(&digraph));
    }

    #[test]
    fn sharing_never_adds_nodes(paths in arb_pathbuilder()) {
        let none = build(&paths, Deduplication::None, InverseMap::new()).node_count();
        for mode in [Deduplication::Bundle, Deduplication::Parents, Deduplication::Full] {
            let shared = build(&paths, mode, InverseMap::new()).node_count();
            prop_assert!(shared <= none, "{mode}: {shared} > {none}");
        }
    }

    #[test]
    fn json_is_deterministic(paths in arb_pathbuilder(), mode in arb_mode()) {
        let a = build(&paths, mode, parent_of_child());
        let b = build(&paths, mode, parent_of_child());
        prop_assert_eq!(a.to_json().expect("json"), b.to_json().expect("json"));
    }

    #[test]
    fn edges_are_unique_per_pair(paths in arb_pathbuilder(), mode in arb_mode()) {
        let graph = build(&paths, mode, parent_of_child());
        let edges = graph.edges();
        let pairs: HashSet<_> = edges.iter().map(|e| (e.from, e.to)).collect();
        prop_assert_eq!(pairs.len(), edges.len());
        for edge in &edges {
            prop_assert!(graph.has_node(edge.from) && graph.has_node(edge.to));
        }
    }
}
