//! # Ingestor Module
//!
//! Record validation and ingestion protocol for CiteRank CORE.
//!
//! - Validate records before graph mutation
//! - Skip malformed records and count them
//! - Metadata first, citations second
//! - No enrichment beyond the placeholder rules of the store

use crate::graph::GraphStore;
use crate::primitives::{MAX_PAPER_ID_LENGTH, MAX_TEXT_LENGTH};
use crate::shared::SharedGraph;
use crate::{CitationRecord, CiteRankError, MetadataRecord, NodeId, PaperId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Processed/skipped counters for one record stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IngestReport {
    /// Records that reached the graph.
    pub processed: usize,
    /// Records rejected by validation.
    pub skipped: usize,
}

impl IngestReport {
    /// Combine two reports.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            processed: self.processed + other.processed,
            skipped: self.skipped + other.skipped,
        }
    }

    /// Total records seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.processed + self.skipped
    }

    fn processed() -> Self {
        Self {
            processed: 1,
            skipped: 0,
        }
    }

    fn skipped() -> Self {
        Self {
            processed: 0,
            skipped: 1,
        }
    }
}

/// The Ingestor handles record validation and graph ingestion.
pub struct Ingestor;

impl Ingestor {
    /// Validate a metadata record.
    ///
    /// Returns `CiteRankError::InvalidRecord` if the id is empty or too long,
    /// or a text field exceeds `MAX_TEXT_LENGTH`.
    pub fn validate_metadata(record: &MetadataRecord) -> Result<(), CiteRankError> {
        validate_paper_id(&record.paper)?;
        validate_text("title", &record.title)?;
        validate_text("url", &record.url)?;
        Ok(())
    }

    /// Validate a citation record.
    pub fn validate_citation(record: &CitationRecord) -> Result<(), CiteRankError> {
        validate_paper_id(&record.cited)?;
        validate_paper_id(&record.citing)?;
        if let Some(title) = &record.citing_title {
            validate_text("citing title", title)?;
        }
        Ok(())
    }

    /// Ingest one metadata record. Returns the paper's node.
    pub fn ingest_metadata<G: GraphStore>(
        graph: &mut G,
        record: &MetadataRecord,
    ) -> Result<NodeId, CiteRankError> {
        Self::validate_metadata(record)?;
        graph.create_or_get_node(&record.paper, record.attributes())
    }

    /// Ingest one citation record. Returns `(cited, citing)`.
    pub fn ingest_citation<G: GraphStore>(
        graph: &mut G,
        record: &CitationRecord,
    ) -> Result<(NodeId, NodeId), CiteRankError> {
        Self::validate_citation(record)?;
        graph.add_citation(record)
    }

    /// Ingest a metadata stream.
    ///
    /// Invalid records are skipped and counted; store errors abort.
    pub fn ingest_metadata_batch<G, I>(graph: &mut G, records: I) -> Result<IngestReport, CiteRankError>
    where
        G: GraphStore,
        I: IntoIterator<Item = MetadataRecord>,
    {
        let mut report = IngestReport::default();
        for record in records {
            if Self::validate_metadata(&record).is_err() {
                report = report.merge(IngestReport::skipped());
                continue;
            }
            graph.create_or_get_node(&record.paper, record.attributes())?;
            report = report.merge(IngestReport::processed());
        }
        Ok(report)
    }

    /// Ingest a citation stream.
    pub fn ingest_citation_batch<G, I>(graph: &mut G, records: I) -> Result<IngestReport, CiteRankError>
    where
        G: GraphStore,
        I: IntoIterator<Item = CitationRecord>,
    {
        let mut report = IngestReport::default();
        for record in records {
            if Self::validate_citation(&record).is_err() {
                report = report.merge(IngestReport::skipped());
                continue;
            }
            graph.add_citation(&record)?;
            report = report.merge(IngestReport::processed());
        }
        Ok(report)
    }

    /// Ingest citations from many workers at once.
    ///
    /// Every insertion goes through the shared writer lock. Index assignment
    /// order depends on scheduling; the set of nodes and edges does not.
    pub fn ingest_citations_parallel(
        graph: &SharedGraph,
        records: &[CitationRecord],
    ) -> Result<IngestReport, CiteRankError> {
        records
            .par_iter()
            .map(|record| {
                if Self::validate_citation(record).is_err() {
                    return Ok(IngestReport::skipped());
                }
                graph.add_citation(record).map(|_| IngestReport::processed())
            })
            .try_reduce(IngestReport::default, |a, b| Ok(a.merge(b)))
    }
}

fn validate_paper_id(paper: &PaperId) -> Result<(), CiteRankError> {
    if paper.is_empty() {
        return Err(CiteRankError::InvalidRecord("empty paper id".to_string()));
    }
    if paper.as_str().len() > MAX_PAPER_ID_LENGTH {
        return Err(CiteRankError::InvalidRecord(format!(
            "paper id longer than {} bytes",
            MAX_PAPER_ID_LENGTH
        )));
    }
    Ok(())
}

fn validate_text(field: &str, value: &str) -> Result<(), CiteRankError> {
    if value.len() > MAX_TEXT_LENGTH {
        return Err(CiteRankError::InvalidRecord(format!(
            "{} longer than {} bytes",
            field, MAX_TEXT_LENGTH
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
