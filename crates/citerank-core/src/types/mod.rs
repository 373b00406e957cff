//! # Core Type Definitions
//!
//! This module contains all core types for the CiteRank citation graph:
//! - Identifiers (`PaperId`, `NodeId`)
//! - Node attributes and nodes (`PaperAttributes`, `Node`)
//! - Ingestion records (`MetadataRecord`, `CitationRecord`, `PaperDetails`)
//! - Error types (`CiteRankError`)
//!
//! ## Ordering Guarantees
//!
//! Identifier types implement `Ord` so the identity index can live in a
//! `BTreeMap` and iterate deterministically.

use crate::primitives::{PAPER_URL_PREFIX, UNKNOWN_TITLE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// External identifier of a paper, as assigned by the publisher or index
/// the records were harvested from.
///
/// Opaque: the core never parses or formats it, only compares it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaperId(String);

impl PaperId {
    /// Create a paper id from any string.
    ///
    /// Emptiness is checked at resolution time, not here.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for PaperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaperId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PaperId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Dense, run-local internal index of a node.
///
/// Assigned at first creation, 0-based, never reused. The Rank Engine
/// indexes its vectors with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// The index as a `usize`, for vector access.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Build a node id from a vector position.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u64)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// NODE ATTRIBUTES
// =============================================================================

/// Descriptive attributes of a paper node.
///
/// Stored verbatim on first creation and never overwritten afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaperAttributes {
    /// Display name (paper title, or the id itself for placeholders).
    pub name: String,
    /// Canonical URL.
    pub url: String,
    /// Publication year, 0 when unknown.
    pub year: i32,
    /// Citation count reported by the metadata source. Seeds the ranking.
    pub citation_count: u32,
}

impl PaperAttributes {
    /// Create attributes from their parts.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>, year: i32, citation_count: u32) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            year,
            citation_count,
        }
    }

    /// Placeholder for a cited paper that never appeared in the metadata stream.
    ///
    /// The name is the id itself and the year is unknown.
    #[must_use]
    pub fn cited_placeholder(paper: &PaperId) -> Self {
        Self {
            name: paper.as_str().to_string(),
            url: paper_url(paper),
            year: 0,
            citation_count: 0,
        }
    }

    /// Placeholder for a citing paper, using whatever the edge record carried.
    #[must_use]
    pub fn citing_placeholder(paper: &PaperId, title: Option<&str>, year: Option<i32>) -> Self {
        Self {
            name: title.unwrap_or(UNKNOWN_TITLE).to_string(),
            url: paper_url(paper),
            year: year.unwrap_or(0),
            citation_count: 0,
        }
    }
}

/// Canonical landing page for a paper id.
#[must_use]
pub fn paper_url(paper: &PaperId) -> String {
    format!("{}{}", PAPER_URL_PREFIX, paper.as_str())
}

// =============================================================================
// NODE
// =============================================================================

/// A paper node in the citation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Dense internal index.
    pub id: NodeId,
    /// External paper id.
    pub paper: PaperId,
    /// Descriptive attributes (first writer wins).
    pub attributes: PaperAttributes,
    /// True when the node was created implicitly from a citation record.
    pub placeholder: bool,
    /// Authority score, present only after ranking.
    pub rank: Option<f64>,
}

impl Node {
    /// Create a new, unranked node.
    #[must_use]
    pub fn new(id: NodeId, paper: PaperId, attributes: PaperAttributes, placeholder: bool) -> Self {
        Self {
            id,
            paper,
            attributes,
            placeholder,
            rank: None,
        }
    }
}

// =============================================================================
// INGESTION RECORDS
// =============================================================================

/// One known paper from the metadata stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub paper: PaperId,
    pub url: String,
    pub title: String,
    pub year: i32,
    pub citation_count: u32,
}

impl MetadataRecord {
    /// The attributes this record carries.
    #[must_use]
    pub fn attributes(&self) -> PaperAttributes {
        PaperAttributes::new(&self.title, &self.url, self.year, self.citation_count)
    }
}

/// One citation from the citation stream: `citing` cites `cited`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRecord {
    pub cited: PaperId,
    pub citing: PaperId,
    pub citing_title: Option<String>,
    pub citing_year: Option<i32>,
}

impl CitationRecord {
    /// Create a citation record without citing-paper details.
    #[must_use]
    pub fn new(cited: impl Into<PaperId>, citing: impl Into<PaperId>) -> Self {
        Self {
            cited: cited.into(),
            citing: citing.into(),
            citing_title: None,
            citing_year: None,
        }
    }

    /// Attach the citing paper's title and year.
    #[must_use]
    pub fn with_citing_details(mut self, title: Option<String>, year: Option<i32>) -> Self {
        self.citing_title = title;
        self.citing_year = year;
        self
    }
}

/// Extended paper details kept alongside the ranked graph.
///
/// Keyed by `url` in the rank database; not part of the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaperDetails {
    pub arxiv_id: String,
    pub citation_count: u32,
    pub year: i32,
    pub semantic_id: String,
    pub url: String,
    pub abstract_text: String,
    pub title: String,
    pub published_date: String,
    pub tldr: String,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the CiteRank system.
///
/// - No silent failures
/// - Use `Result<T, CiteRankError>` for fallible operations
/// - Contract violations (empty ids) are errors the run must not survive
#[derive(Debug, Error)]
pub enum CiteRankError {
    /// An empty external id reached identity resolution.
    #[error("Empty paper id passed to identity resolution")]
    EmptyPaperId,

    /// A record failed validation.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// The requested node was not found in the graph.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Scores were already written to this graph.
    #[error("Graph already ranked")]
    AlreadyRanked,

    /// A ranking does not belong to this graph.
    #[error("Ranking covers {ranking} nodes but graph has {graph}")]
    RankingMismatch { ranking: usize, graph: usize },

    /// The shared graph lock was poisoned by a panicking writer.
    #[error("Graph lock poisoned")]
    LockPoisoned,

    /// Other handles to a shared graph are still alive.
    #[error("Graph still shared by {handles} other handle(s)")]
    GraphStillShared { handles: usize },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The rank database reported an error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A configuration value is out of range.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for CiteRankError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
