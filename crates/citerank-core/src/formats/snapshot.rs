//! # Snapshot Format
//!
//! Binary snapshot of a citation graph, scores included.
//!
//! Format: Header (21 bytes) + postcard-serialized payload.
//! - 4 bytes: Magic ("CRNK")
//! - 1 byte: Version
//! - 8 bytes: node count (little endian)
//! - 8 bytes: edge count (little endian)
//!
//! Nodes are stored in index order and edges in recording order, so
//! save -> load -> save reproduces the same bytes. Scores are stored as raw
//! `f64` bits.
//!
//! ## Limits
//!
//! Total size and the announced counts are checked before the payload is
//! decoded.

use crate::graph::Graph;
use crate::primitives::{
    FORMAT_VERSION, MAGIC_BYTES, MAX_SNAPSHOT_EDGE_COUNT, MAX_SNAPSHOT_NODE_COUNT,
    MAX_SNAPSHOT_SIZE,
};
use crate::{CiteRankError, Node, NodeId};
use serde::{Deserialize, Serialize};

/// Header length in bytes.
pub const HEADER_SIZE: usize = 21;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub node_count: u64,
    pub edge_count: u64,
}

impl SnapshotHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new(node_count: u64, edge_count: u64) -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
            node_count,
            edge_count,
        }
    }

    /// Check magic, version and announced counts.
    pub fn validate(&self) -> Result<(), CiteRankError> {
        if &self.magic != MAGIC_BYTES {
            return Err(CiteRankError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(CiteRankError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        if self.node_count > MAX_SNAPSHOT_NODE_COUNT {
            return Err(CiteRankError::SerializationError(format!(
                "Node count {} exceeds maximum allowed {}",
                self.node_count, MAX_SNAPSHOT_NODE_COUNT
            )));
        }
        if self.edge_count > MAX_SNAPSHOT_EDGE_COUNT {
            return Err(CiteRankError::SerializationError(format!(
                "Edge count {} exceeds maximum allowed {}",
                self.edge_count, MAX_SNAPSHOT_EDGE_COUNT
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes[5..13].copy_from_slice(&self.node_count.to_le_bytes());
        bytes[13..21].copy_from_slice(&self.edge_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CiteRankError> {
        let header = bytes.get(..HEADER_SIZE).ok_or_else(|| {
            CiteRankError::SerializationError("Header too short".to_string())
        })?;

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        let mut node_count = [0u8; 8];
        node_count.copy_from_slice(&header[5..13]);
        let mut edge_count = [0u8; 8];
        edge_count.copy_from_slice(&header[13..21]);

        Ok(Self {
            magic,
            version: header[4],
            node_count: u64::from_le_bytes(node_count),
            edge_count: u64::from_le_bytes(edge_count),
        })
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

#[derive(Serialize)]
struct PayloadRef<'a> {
    nodes: Vec<&'a Node>,
    edges: Vec<(u64, u64)>,
}

#[derive(Deserialize)]
struct Payload {
    nodes: Vec<Node>,
    edges: Vec<(u64, u64)>,
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a graph to snapshot bytes.
pub fn graph_to_snapshot(graph: &Graph) -> Result<Vec<u8>, CiteRankError> {
    let payload = PayloadRef {
        nodes: graph.nodes().collect(),
        edges: graph.edges().map(|(cited, citing)| (cited.0, citing.0)).collect(),
    };
    let header = SnapshotHeader::new(payload.nodes.len() as u64, payload.edges.len() as u64);

    let body = postcard::to_stdvec(&payload)
        .map_err(|e| CiteRankError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + body.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&body);
    Ok(result)
}

/// Rebuild a graph from snapshot bytes.
///
/// The registry, incidence and out-degrees are reconstructed; the graph is
/// ranked again only if every node carries a score.
pub fn graph_from_snapshot(bytes: &[u8]) -> Result<Graph, CiteRankError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(CiteRankError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload: Payload = postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| {
        CiteRankError::SerializationError(format!("Failed to deserialize snapshot: {}", e))
    })?;

    if payload.nodes.len() as u64 != header.node_count
        || payload.edges.len() as u64 != header.edge_count
    {
        return Err(CiteRankError::SerializationError(
            "Snapshot counts do not match header".to_string(),
        ));
    }

    let edges = payload
        .edges
        .into_iter()
        .map(|(cited, citing)| (NodeId(cited), NodeId(citing)))
        .collect();
    Graph::from_parts(payload.nodes, edges)
}

// =============================================================================
// TESTS
// =============================================================================
