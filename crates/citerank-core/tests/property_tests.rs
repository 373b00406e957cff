//! # Property-Based Tests
//!
//! Identity, indexing and ranking invariants checked with proptest.

use citerank_core::{
    CitationRecord, Graph, GraphStore, MetadataRecord, NodeId, PaperAttributes, PaperId,
    RankEngine, graph_from_snapshot, graph_to_snapshot,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

const TOLERANCE: f64 = 1e-6;

/// Node count, per-node citation counts and a list of (cited, citing) pairs.
fn graph_input() -> impl Strategy<Value = (Vec<u32>, Vec<(usize, usize)>)> {
    (1usize..30).prop_flat_map(|n| {
        (
            vec(0u32..5000, n),
            vec((0..n, 0..n), 0..80),
        )
    })
}

fn paper_name(i: usize) -> String {
    format!("paper-{i}")
}

fn metadata(i: usize, citations: u32) -> MetadataRecord {
    MetadataRecord {
        paper: PaperId::new(paper_name(i)),
        url: format!("https://example.org/{i}"),
        title: format!("Title {i}"),
        year: 2000 + (i % 20) as i32,
        citation_count: citations,
    }
}

fn build(citations: &[u32], edges: &[(usize, usize)]) -> Graph {
    let mut graph = Graph::new();
    for (i, &c) in citations.iter().enumerate() {
        let record = metadata(i, c);
        graph
            .create_or_get_node(&record.paper, record.attributes())
            .expect("create");
    }
    for &(cited, citing) in edges {
        graph
            .add_citation(&CitationRecord::new(paper_name(cited), paper_name(citing)))
            .expect("edge");
    }
    graph
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Every distinct id gets exactly one index, however often it is seen.
    #[test]
    fn identity_is_unique(ids in vec("[a-e]{1,3}", 1..100)) {
        let mut graph = Graph::new();
        let mut seen = Vec::new();

        for id in &ids {
            let paper = PaperId::new(id.as_str());
            let node = graph
                .create_or_get_node(&paper, PaperAttributes::default())
                .expect("create");
            seen.push((paper, node));
        }

        let distinct: BTreeSet<&String> = ids.iter().collect();
        prop_assert_eq!(graph.node_count().expect("count"), distinct.len());

        for (paper, node) in &seen {
            prop_assert_eq!(graph.lookup(paper).map(|n| n.id), Some(*node));
        }
    }

    /// Indices are exactly `0..node_count`.
    #[test]
    fn indices_are_dense((citations, edges) in graph_input()) {
        let graph = build(&citations, &edges);
        let ids: Vec<NodeId> = graph.nodes().map(|n| n.id).collect();
        let expected: Vec<NodeId> = (0..graph.len()).map(NodeId::from_index).collect();
        prop_assert_eq!(ids, expected);
    }

    /// The distribution sums to 1 and the top score is exactly 1.0.
    #[test]
    fn rank_mass_is_conserved((citations, edges) in graph_input()) {
        let graph = build(&citations, &edges);
        let ranking = RankEngine::default().rank(&graph);

        let mass: f64 = ranking.distribution().iter().sum();
        prop_assert!((mass - 1.0).abs() < TOLERANCE, "mass {}", mass);

        let max = ranking.scores().iter().copied().fold(f64::MIN, f64::max);
        prop_assert_eq!(max, 1.0);
        prop_assert!(ranking.scores().iter().all(|&s| s > 0.0 && s <= 1.0));
        prop_assert!(ranking.report().iterations <= 100);
    }

    /// Repeating edges leaves every score bit-identical.
    #[test]
    fn duplicate_edges_do_not_change_scores((citations, edges) in graph_input()) {
        let single = build(&citations, &edges);
        let doubled: Vec<(usize, usize)> = edges.iter().chain(edges.iter()).copied().collect();
        let twice = build(&citations, &doubled);

        let a = RankEngine::default().rank(&single);
        let b = RankEngine::default().rank(&twice);
        prop_assert_eq!(a.scores(), b.scores());
    }

    /// Edge insertion order changes indices, not per-paper scores.
    #[test]
    fn insertion_order_does_not_change_scores(
        (citations, edges) in graph_input(),
    ) {
        let forward = build(&citations, &edges);
        let reversed_edges: Vec<(usize, usize)> = edges.iter().rev().copied().collect();

        // Reverse the metadata order too, so indices really differ.
        let mut backward = Graph::new();
        for (i, &c) in citations.iter().enumerate().rev() {
            let record = metadata(i, c);
            backward
                .create_or_get_node(&record.paper, record.attributes())
                .expect("create");
        }
        for &(cited, citing) in &reversed_edges {
            backward
                .add_citation(&CitationRecord::new(paper_name(cited), paper_name(citing)))
                .expect("edge");
        }

        let a = RankEngine::default().rank(&forward);
        let b = RankEngine::default().rank(&backward);

        for node in forward.nodes() {
            let other = backward.lookup(&node.paper).expect("same papers");
            let score_a = a.get(node.id).expect("score");
            let score_b = b.get(other.id).expect("score");
            prop_assert!((score_a - score_b).abs() < TOLERANCE, "{} vs {}", score_a, score_b);
        }
    }

    /// The first attributes stored for an id are the ones kept.
    #[test]
    fn first_writer_wins(first in 0u32..1000, second in 0u32..1000) {
        let mut graph = Graph::new();
        let paper = PaperId::new("p");
        graph
            .create_or_get_node(&paper, PaperAttributes::new("first", "", 2000, first))
            .expect("create");
        graph
            .create_or_get_node(&paper, PaperAttributes::new("second", "", 2001, second))
            .expect("create");

        let node = graph.lookup(&paper).expect("node");
        prop_assert_eq!(node.attributes.citation_count, first);
        prop_assert_eq!(node.attributes.name.as_str(), "first");
    }

    /// Snapshots reproduce the same bytes after a load.
    #[test]
    fn snapshot_is_bit_exact((citations, edges) in graph_input()) {
        let mut graph = build(&citations, &edges);
        let ranking = RankEngine::default().rank(&graph);
        graph.apply_ranking(&ranking).expect("apply");

        let first = graph_to_snapshot(&graph).expect("save");
        let second = graph_to_snapshot(&graph_from_snapshot(&first).expect("load")).expect("save");
        prop_assert_eq!(first, second);
    }
}
