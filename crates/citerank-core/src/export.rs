//! # Export Adapter
//!
//! Walks a [`Graph`] and hands every node and edge to an [`ExportSink`].
//!
//! Rows carry external ids resolved through the identity registry, never
//! ids formatted from internal indices. Nodes are emitted in index order,
//! edges in recording order (duplicates included).

use crate::graph::Graph;
use crate::{CiteRankError, Node, NodeId, PaperId};
use serde::{Deserialize, Serialize};

// =============================================================================
// ROWS
// =============================================================================

/// One exported node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    pub index: u64,
    pub external_id: String,
    pub name: String,
    pub url: String,
    pub year: i32,
    pub citation_count: u32,
    /// Absent before ranking.
    pub rank_score: Option<f64>,
}

impl NodeRow {
    fn from_node(node: &Node, external_id: &PaperId) -> Self {
        Self {
            index: node.id.0,
            external_id: external_id.as_str().to_string(),
            name: node.attributes.name.clone(),
            url: node.attributes.url.clone(),
            year: node.attributes.year,
            citation_count: node.attributes.citation_count,
            rank_score: node.rank,
        }
    }
}

/// One exported cited -> citing edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub source: u64,
    pub target: u64,
    pub source_id: String,
    pub target_id: String,
}

// =============================================================================
// SINK
// =============================================================================

/// Destination of an export run.
///
/// `begin` is called once before any row and `finish` once after the last.
pub trait ExportSink {
    fn begin(&mut self, node_count: usize, edge_count: usize) -> Result<(), CiteRankError>;

    fn write_node(&mut self, row: &NodeRow) -> Result<(), CiteRankError>;

    fn write_edge(&mut self, row: &EdgeRow) -> Result<(), CiteRankError>;

    fn finish(&mut self) -> Result<(), CiteRankError>;
}

/// Drive `sink` over every node and edge of `graph`.
///
/// # Errors
///
/// Propagates the first sink error. Returns `NodeNotFound` if an index has no
/// registry entry, which only happens on a corrupted graph.
pub fn export_graph<S: ExportSink + ?Sized>(graph: &Graph, sink: &mut S) -> Result<(), CiteRankError> {
    let registry = graph.registry();
    let external = |id: NodeId| registry.paper_id(id).ok_or(CiteRankError::NodeNotFound(id));

    let edge_count = graph.edges().count();
    sink.begin(graph.len(), edge_count)?;

    for node in graph.nodes() {
        sink.write_node(&NodeRow::from_node(node, external(node.id)?))?;
    }

    for (cited, citing) in graph.edges() {
        sink.write_edge(&EdgeRow {
            source: cited.0,
            target: citing.0,
            source_id: external(cited)?.as_str().to_string(),
            target_id: external(citing)?.as_str().to_string(),
        })?;
    }

    sink.finish()
}

/// Sink that keeps every row in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectingSink {
    pub nodes: Vec<NodeRow>,
    pub edges: Vec<EdgeRow>,
    #[serde(skip)]
    pub finished: bool,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExportSink for CollectingSink {
    fn begin(&mut self, node_count: usize, edge_count: usize) -> Result<(), CiteRankError> {
        self.nodes = Vec::with_capacity(node_count);
        self.edges = Vec::with_capacity(edge_count);
        self.finished = false;
        Ok(())
    }

    fn write_node(&mut self, row: &NodeRow) -> Result<(), CiteRankError> {
        self.nodes.push(row.clone());
        Ok(())
    }

    fn write_edge(&mut self, row: &EdgeRow) -> Result<(), CiteRankError> {
        self.edges.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CiteRankError> {
        self.finished = true;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
