//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use citerank_core::{Citations, DatabaseStatus, NodeRow, PaperDetails};
use serde::{Deserialize, Serialize};

/// Default number of papers returned by `/papers/top`.
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// Upper bound on `limit` for `/papers/top`.
pub const MAX_TOP_LIMIT: usize = 1000;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every non-2xx response except auth and rate-limit rejections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Rank database status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub node_count: u64,
    pub edge_count: u64,
    pub distinct_edge_count: u64,
    pub dangling_count: u64,
    pub paper_info_count: u64,
    pub ranked: bool,
}

impl From<DatabaseStatus> for StatusResponse {
    fn from(status: DatabaseStatus) -> Self {
        Self {
            node_count: status.node_count,
            edge_count: status.edge_count,
            distinct_edge_count: status.distinct_edge_count,
            dangling_count: status.dangling_count,
            paper_info_count: status.paper_info_count,
            ranked: status.ranked,
        }
    }
}

// =============================================================================
// PAPERS
// =============================================================================

/// A paper as the API presents it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperJson {
    pub id: String,
    pub index: u64,
    pub title: String,
    pub url: String,
    pub year: i32,
    pub citation_count: u32,
    pub rank: Option<f64>,
}

impl From<NodeRow> for PaperJson {
    fn from(row: NodeRow) -> Self {
        Self {
            id: row.external_id,
            index: row.index,
            title: row.name,
            url: row.url,
            year: row.year,
            citation_count: row.citation_count,
            rank: row.rank_score,
        }
    }
}

/// Query string of `/papers/top`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

impl TopQuery {
    /// Requested limit, defaulted and capped.
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_TOP_LIMIT).min(MAX_TOP_LIMIT)
    }
}

/// Top-ranked papers, best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopResponse {
    pub limit: usize,
    pub papers: Vec<PaperJson>,
}

/// One paper with its stored details, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperResponse {
    pub paper: PaperJson,
    pub details: Option<PaperDetails>,
}

/// A paper and its citation neighbourhood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationsResponse {
    pub paper: PaperJson,
    /// Papers citing this one.
    pub cited_by: Vec<PaperJson>,
    /// Papers this one cites.
    pub references: Vec<PaperJson>,
}

impl From<Citations> for CitationsResponse {
    fn from(citations: Citations) -> Self {
        Self {
            paper: citations.paper.into(),
            cited_by: citations.cited_by.into_iter().map(PaperJson::from).collect(),
            references: citations.references.into_iter().map(PaperJson::from).collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
