//! # citerank-core
//!
//! The citation Graph Store and Rank Engine for CiteRank - THE LOGIC.
//!
//! Papers and citations come in as records, land in an append-only graph
//! keyed by dense internal indices, and are scored by a citation-biased
//! power iteration. Results leave through the export sink protocol.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is synchronous: no async, no network dependencies
//! - Performs no file or console I/O of its own; formats write to any `Write`
//! - Has no logging dependency: diagnostics come back as data
//! - Treats an empty paper id as a contract violation, never as input

// =============================================================================
// MODULES
// =============================================================================

pub mod export;
pub mod formats;
pub mod graph;
pub mod ingestor;
pub mod primitives;
pub mod rank;
pub mod registry;
pub mod shared;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CitationRecord, CiteRankError, MetadataRecord, Node, NodeId, PaperAttributes, PaperDetails,
    PaperId, paper_url,
};

// =============================================================================
// RE-EXPORTS: Graph Store + Rank Engine
// =============================================================================

pub use export::{CollectingSink, EdgeRow, ExportSink, NodeRow, export_graph};
pub use graph::{Graph, GraphStats, GraphStore};
pub use ingestor::{IngestReport, Ingestor};
pub use rank::{IterationStep, PowerIteration, RankConfig, RankEngine, RankReport, Ranking};
pub use registry::IdentityRegistry;
pub use shared::SharedGraph;
pub use storage::{Citations, DatabaseStatus, RankDatabase};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{DotWriter, JsonDocument, JsonWriter, SnapshotHeader, graph_from_snapshot, graph_to_snapshot};
