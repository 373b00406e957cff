//! # Graph Store
//!
//! The citation graph storage for CiteRank CORE.
//!
//! This module implements the `GraphStore` trait for the in-memory `Graph`.
//! Edges run from the **cited** paper to the **citing** paper.
//!
//! Every recorded edge is kept for export, in insertion order. The ranking
//! incidence structure only sees each ordered pair once, so the store also
//! keeps the distinct pair set and the distinct out-degree of every node.

use crate::rank::Ranking;
use crate::registry::IdentityRegistry;
use crate::{CitationRecord, CiteRankError, Node, NodeId, PaperAttributes, PaperId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The GraphStore trait defines the mutations both record streams need.
///
/// Implemented by the owned [`Graph`] and by [`crate::shared::SharedGraph`],
/// so the ingestor works the same against either.
pub trait GraphStore {
    /// Create the node for `paper` with `attributes`, or return the existing
    /// index. Existing attributes are never overwritten.
    fn create_or_get_node(
        &mut self,
        paper: &PaperId,
        attributes: PaperAttributes,
    ) -> Result<NodeId, CiteRankError>;

    /// Record one citation as a cited→citing edge, creating placeholder
    /// nodes for endpoints not seen before.
    ///
    /// Returns `(cited, citing)` indices.
    fn add_citation(&mut self, record: &CitationRecord) -> Result<(NodeId, NodeId), CiteRankError>;

    /// Get the total number of nodes.
    fn node_count(&self) -> Result<usize, CiteRankError>;

    /// Get the total number of recorded edges, duplicates included.
    fn edge_count(&self) -> Result<usize, CiteRankError>;
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The main Graph structure.
///
/// Nodes live in a `Vec` indexed by their dense `NodeId`.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// External id <-> internal index.
    registry: IdentityRegistry,

    /// Node storage, position == NodeId.
    nodes: Vec<Node>,

    /// Every recorded cited -> citing edge, in insertion order.
    edges: Vec<(NodeId, NodeId)>,

    /// Distinct cited -> citing pairs (the ranking incidence).
    incidence: BTreeSet<(NodeId, NodeId)>,

    /// Distinct out-degree per node.
    out_degree: Vec<usize>,

    /// Set once scores have been written.
    ranked: bool,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from stored nodes and edges.
    ///
    /// Nodes must carry dense ids `0..n` in order and every edge endpoint must
    /// exist. The graph counts as ranked when every node has a score.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<(NodeId, NodeId)>) -> Result<Self, CiteRankError> {
        let mut graph = Self::new();

        for (position, node) in nodes.into_iter().enumerate() {
            if node.id.index() != position {
                return Err(CiteRankError::SerializationError(format!(
                    "Node id {} stored at position {}",
                    node.id, position
                )));
            }
            let (id, created) = graph.registry.resolve_or_insert(&node.paper)?;
            if !created || id != node.id {
                return Err(CiteRankError::SerializationError(format!(
                    "Duplicate paper id {}",
                    node.paper
                )));
            }
            graph.nodes.push(node);
            graph.out_degree.push(0);
        }

        for (cited, citing) in edges {
            if cited.index() >= graph.nodes.len() || citing.index() >= graph.nodes.len() {
                return Err(CiteRankError::SerializationError(format!(
                    "Edge {} -> {} references a missing node",
                    cited, citing
                )));
            }
            graph.push_edge(cited, citing);
        }

        graph.ranked = !graph.nodes.is_empty() && graph.nodes.iter().all(|n| n.rank.is_some());
        Ok(graph)
    }

    /// A copy of this graph with every score cleared, ready to be ranked again.
    pub fn unranked(&self) -> Result<Self, CiteRankError> {
        let nodes = self
            .nodes
            .iter()
            .map(|node| Node { rank: None, ..node.clone() })
            .collect();
        Self::from_parts(nodes, self.edges.clone())
    }

    /// Add a citation edge between two papers, with default placeholders.
    ///
    /// Equivalent to [`GraphStore::add_citation`] with a record that carries
    /// no citing-paper details.
    pub fn add_edge(&mut self, cited: &PaperId, citing: &PaperId) -> Result<(NodeId, NodeId), CiteRankError> {
        self.add_citation(&CitationRecord::new(cited.clone(), citing.clone()))
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get all nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Get all recorded edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edges.iter().copied()
    }

    /// Distinct edges, sorted by (cited, citing).
    pub fn distinct_edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.incidence.iter().copied()
    }

    /// Number of distinct cited -> citing pairs.
    #[must_use]
    pub fn distinct_edge_count(&self) -> usize {
        self.incidence.len()
    }

    /// Get a node by index.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Find a node by its external id.
    #[must_use]
    pub fn lookup(&self, paper: &PaperId) -> Option<&Node> {
        self.registry.lookup(paper).and_then(|id| self.node(id))
    }

    /// The identity registry backing this graph.
    #[must_use]
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Distinct out-degree (number of distinct citing papers) of a node.
    #[must_use]
    pub fn out_degree(&self, id: NodeId) -> usize {
        self.out_degree.get(id.index()).copied().unwrap_or(0)
    }

    /// Whether scores have been written.
    #[must_use]
    pub fn is_ranked(&self) -> bool {
        self.ranked
    }

    /// Number of nodes created from citation records only.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.placeholder).count()
    }

    /// Summary counts for status reporting.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            distinct_edge_count: self.incidence.len(),
            placeholder_count: self.placeholder_count(),
            dangling_count: self.out_degree.iter().filter(|&&d| d == 0).count(),
            max_citation_count: self
                .nodes
                .iter()
                .map(|n| n.attributes.citation_count)
                .max()
                .unwrap_or(0),
            ranked: self.ranked,
        }
    }

    /// Write scores into the nodes. Scores are write-once.
    ///
    /// # Errors
    ///
    /// - `CiteRankError::AlreadyRanked` on a second call
    /// - `CiteRankError::RankingMismatch` if the ranking was computed for a
    ///   graph with a different node count
    pub fn apply_ranking(&mut self, ranking: &Ranking) -> Result<(), CiteRankError> {
        if self.ranked {
            return Err(CiteRankError::AlreadyRanked);
        }
        if ranking.len() != self.nodes.len() {
            return Err(CiteRankError::RankingMismatch {
                ranking: ranking.len(),
                graph: self.nodes.len(),
            });
        }

        for (node, score) in self.nodes.iter_mut().zip(ranking.scores()) {
            node.rank = Some(*score);
        }
        self.ranked = true;
        Ok(())
    }

    fn insert_node(&mut self, paper: &PaperId, attributes: PaperAttributes, placeholder: bool) -> Result<NodeId, CiteRankError> {
        let (id, created) = self.registry.resolve_or_insert(paper)?;
        if created {
            self.nodes.push(Node::new(id, paper.clone(), attributes, placeholder));
            self.out_degree.push(0);
        }
        Ok(id)
    }

    fn insert_node_with(
        &mut self,
        paper: &PaperId,
        placeholder: impl FnOnce() -> PaperAttributes,
    ) -> Result<NodeId, CiteRankError> {
        match self.registry.lookup(paper) {
            Some(id) => Ok(id),
            None => self.insert_node(paper, placeholder(), true),
        }
    }

    fn push_edge(&mut self, cited: NodeId, citing: NodeId) {
        self.edges.push((cited, citing));
        if self.incidence.insert((cited, citing)) {
            if let Some(degree) = self.out_degree.get_mut(cited.index()) {
                *degree += 1;
            }
        }
    }
}

impl GraphStore for Graph {
    fn create_or_get_node(
        &mut self,
        paper: &PaperId,
        attributes: PaperAttributes,
    ) -> Result<NodeId, CiteRankError> {
        self.insert_node(paper, attributes, false)
    }

    fn add_citation(&mut self, record: &CitationRecord) -> Result<(NodeId, NodeId), CiteRankError> {
        // Both ids are checked before either endpoint is created.
        if record.cited.is_empty() || record.citing.is_empty() {
            return Err(CiteRankError::EmptyPaperId);
        }

        let cited = self.insert_node_with(&record.cited, || {
            PaperAttributes::cited_placeholder(&record.cited)
        })?;
        let citing = self.insert_node_with(&record.citing, || {
            PaperAttributes::citing_placeholder(
                &record.citing,
                record.citing_title.as_deref(),
                record.citing_year,
            )
        })?;

        self.push_edge(cited, citing);
        Ok((cited, citing))
    }

    fn node_count(&self) -> Result<usize, CiteRankError> {
        Ok(self.nodes.len())
    }

    fn edge_count(&self) -> Result<usize, CiteRankError> {
        Ok(self.edges.len())
    }
}

// =============================================================================
// STATS
// =============================================================================

/// Summary counts of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub distinct_edge_count: usize,
    pub placeholder_count: usize,
    pub dangling_count: usize,
    pub max_citation_count: u32,
    pub ranked: bool,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(name: &str, citations: u32) -> PaperAttributes {
        PaperAttributes::new(name, format!("https://example.org/{name}"), 2020, citations)
    }

    #[test]
    fn create_node_is_idempotent() {
        let mut graph = Graph::new();
        let paper = PaperId::new("p1");

        let a = graph.create_or_get_node(&paper, attrs("first", 5)).expect("create");
        let b = graph.create_or_get_node(&paper, attrs("second", 9)).expect("create");

        assert_eq!(a, b);
        assert_eq!(graph.node_count().expect("count"), 1);
    }

    #[test]
    fn first_writer_wins() {
        let mut graph = Graph::new();
        let paper = PaperId::new("p1");

        graph.add_edge(&paper, &PaperId::new("p2")).expect("edge");
        graph.create_or_get_node(&paper, attrs("Real Title", 42)).expect("create");

        let node = graph.lookup(&paper).expect("node");
        assert_eq!(node.attributes.name, "p1");
        assert_eq!(node.attributes.citation_count, 0);
        assert!(node.placeholder);
    }

    #[test]
    fn add_citation_creates_placeholders() {
        let mut graph = Graph::new();
        let record = CitationRecord::new("cited", "citing")
            .with_citing_details(Some("Citing Paper".to_string()), Some(2021));

        let (cited, citing) = graph.add_citation(&record).expect("edge");

        let cited_node = graph.node(cited).expect("cited");
        assert_eq!(cited_node.attributes.name, "cited");
        assert_eq!(cited_node.attributes.year, 0);

        let citing_node = graph.node(citing).expect("citing");
        assert_eq!(citing_node.attributes.name, "Citing Paper");
        assert_eq!(citing_node.attributes.year, 2021);
        assert_eq!(
            citing_node.attributes.url,
            "https://www.semanticscholar.org/paper/citing"
        );
        assert_eq!(graph.placeholder_count(), 2);
    }

    #[test]
    fn add_citation_keeps_metadata_attributes() {
        let mut graph = Graph::new();
        let known = PaperId::new("known");
        graph.create_or_get_node(&known, attrs("Known", 7)).expect("create");

        let record = CitationRecord::new("other", "known")
            .with_citing_details(Some("Different".to_string()), Some(1999));
        graph.add_citation(&record).expect("edge");

        let node = graph.lookup(&known).expect("node");
        assert_eq!(node.attributes.name, "Known");
        assert_eq!(node.attributes.year, 2020);
        assert!(!node.placeholder);
    }

    #[test]
    fn empty_endpoint_rejected_before_mutation() {
        let mut graph = Graph::new();

        let result = graph.add_edge(&PaperId::new("a"), &PaperId::new(""));
        assert!(matches!(result, Err(CiteRankError::EmptyPaperId)));
        assert_eq!(graph.node_count().expect("count"), 0);
    }

    #[test]
    fn duplicate_edges_recorded_but_counted_once_for_incidence() {
        let mut graph = Graph::new();
        let a = PaperId::new("a");
        let b = PaperId::new("b");

        graph.add_edge(&a, &b).expect("edge");
        graph.add_edge(&a, &b).expect("edge");

        assert_eq!(graph.edge_count().expect("count"), 2);
        assert_eq!(graph.distinct_edge_count(), 1);
        let a_id = graph.lookup(&a).expect("a").id;
        assert_eq!(graph.out_degree(a_id), 1);
    }

    #[test]
    fn stats_count_dangling_and_placeholders() {
        let mut graph = Graph::new();
        graph.create_or_get_node(&PaperId::new("a"), attrs("a", 3)).expect("create");
        graph.add_edge(&PaperId::new("a"), &PaperId::new("b")).expect("edge");

        let stats = graph.stats();
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.dangling_count, 1);
        assert_eq!(stats.placeholder_count, 1);
        assert_eq!(stats.max_citation_count, 3);
        assert!(!stats.ranked);
    }

    #[test]
    fn from_parts_rejects_sparse_ids() {
        let node = Node::new(NodeId(1), PaperId::new("a"), attrs("a", 0), false);
        assert!(Graph::from_parts(vec![node], Vec::new()).is_err());
    }

    #[test]
    fn from_parts_rejects_dangling_edge_endpoint() {
        let node = Node::new(NodeId(0), PaperId::new("a"), attrs("a", 0), false);
        assert!(Graph::from_parts(vec![node], vec![(NodeId(0), NodeId(4))]).is_err());
    }

    #[test]
    fn from_parts_restores_registry_and_degrees() {
        let nodes = vec![
            Node::new(NodeId(0), PaperId::new("a"), attrs("a", 1), false),
            Node::new(NodeId(1), PaperId::new("b"), attrs("b", 0), true),
        ];
        let graph = Graph::from_parts(nodes, vec![(NodeId(0), NodeId(1))]).expect("restore");

        assert_eq!(graph.registry().lookup(&PaperId::new("b")), Some(NodeId(1)));
        assert_eq!(graph.out_degree(NodeId(0)), 1);
        assert!(!graph.is_ranked());
    }
}
