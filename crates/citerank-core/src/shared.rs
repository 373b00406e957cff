//! # Shared Graph Handle
//!
//! Concurrent ingestion front for [`Graph`].
//!
//! Node creation and edge insertion share one exclusive lock, so identity
//! resolution and first-writer-wins attribute assignment are atomic with
//! respect to each other. Two producers naming the same unseen paper always
//! get the same index.
//!
//! Ranking never runs through this handle: take the graph back with
//! [`SharedGraph::into_inner`] once every producer has finished.

use crate::graph::{Graph, GraphStore};
use crate::{CitationRecord, CiteRankError, NodeId, PaperAttributes, PaperId};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle to a graph behind a single writer lock.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<Mutex<Graph>>,
}

impl SharedGraph {
    /// Wrap an existing graph.
    #[must_use]
    pub fn new(graph: Graph) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Graph>, CiteRankError> {
        self.inner.lock().map_err(|_| CiteRankError::LockPoisoned)
    }

    /// Create or get a node under the writer lock.
    pub fn create_or_get_node(
        &self,
        paper: &PaperId,
        attributes: PaperAttributes,
    ) -> Result<NodeId, CiteRankError> {
        self.lock()?.create_or_get_node(paper, attributes)
    }

    /// Record a citation under the writer lock.
    pub fn add_citation(&self, record: &CitationRecord) -> Result<(NodeId, NodeId), CiteRankError> {
        self.lock()?.add_citation(record)
    }

    /// Current node count.
    pub fn node_count(&self) -> Result<usize, CiteRankError> {
        Ok(self.lock()?.len())
    }

    /// Current recorded edge count.
    pub fn edge_count(&self) -> Result<usize, CiteRankError> {
        self.lock()?.edge_count()
    }

    /// Take the graph back for ranking.
    ///
    /// Fails with `GraphStillShared` while any other handle is alive and with
    /// `LockPoisoned` if a writer panicked.
    pub fn into_inner(self) -> Result<Graph, CiteRankError> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().map_err(|_| CiteRankError::LockPoisoned),
            Err(shared) => Err(CiteRankError::GraphStillShared {
                handles: Arc::strong_count(&shared) - 1,
            }),
        }
    }
}

impl GraphStore for SharedGraph {
    fn create_or_get_node(
        &mut self,
        paper: &PaperId,
        attributes: PaperAttributes,
    ) -> Result<NodeId, CiteRankError> {
        SharedGraph::create_or_get_node(self, paper, attributes)
    }

    fn add_citation(&mut self, record: &CitationRecord) -> Result<(NodeId, NodeId), CiteRankError> {
        SharedGraph::add_citation(self, record)
    }

    fn node_count(&self) -> Result<usize, CiteRankError> {
        SharedGraph::node_count(self)
    }

    fn edge_count(&self) -> Result<usize, CiteRankError> {
        SharedGraph::edge_count(self)
    }
}
