//! # Identity Registry
//!
//! Maps external paper ids to dense internal node indices.
//!
//! The mapping is append-only: an id gets exactly one index, at first sight,
//! and keeps it for the lifetime of the run. Indices are handed out as
//! `0, 1, 2, ...` with no gaps, so the reverse table is a plain `Vec`.

use crate::{CiteRankError, NodeId, PaperId};
use std::collections::BTreeMap;

/// Bidirectional external-id ↔ internal-index mapping.
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    /// Forward index: external id -> internal index.
    forward: BTreeMap<PaperId, NodeId>,
    /// Reverse table: internal index -> external id.
    reverse: Vec<PaperId>,
}

impl IdentityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an external id, allocating the next dense index if unseen.
    ///
    /// Returns `(index, created)`.
    ///
    /// # Errors
    ///
    /// Returns `CiteRankError::EmptyPaperId` for the empty string. Nothing is
    /// allocated in that case.
    pub fn resolve_or_insert(&mut self, paper: &PaperId) -> Result<(NodeId, bool), CiteRankError> {
        if paper.is_empty() {
            return Err(CiteRankError::EmptyPaperId);
        }
        if let Some(&id) = self.forward.get(paper) {
            return Ok((id, false));
        }

        let id = NodeId::from_index(self.reverse.len());
        self.forward.insert(paper.clone(), id);
        self.reverse.push(paper.clone());
        Ok((id, true))
    }

    /// Resolve an external id to its internal index.
    pub fn resolve(&mut self, paper: &PaperId) -> Result<NodeId, CiteRankError> {
        self.resolve_or_insert(paper).map(|(id, _)| id)
    }

    /// Look up an id without allocating.
    #[must_use]
    pub fn lookup(&self, paper: &PaperId) -> Option<NodeId> {
        self.forward.get(paper).copied()
    }

    /// Reverse mapping: the external id behind an internal index.
    #[must_use]
    pub fn paper_id(&self, id: NodeId) -> Option<&PaperId> {
        self.reverse.get(id.index())
    }

    /// Number of registered ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    /// Whether nothing has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// All `(index, external id)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &PaperId)> + '_ {
        self.reverse
            .iter()
            .enumerate()
            .map(|(i, paper)| (NodeId::from_index(i), paper))
    }
}
