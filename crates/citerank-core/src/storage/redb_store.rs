//! # redb-backed Rank Database
//!
//! Durable, queryable output of a ranking run.
//!
//! The database is written through the [`ExportSink`] protocol: one export
//! run replaces the node, index and edge tables in a single transaction.
//! Paper details live in their own table keyed by URL and survive rebuilds;
//! the first row stored for a URL wins.
//!
//! Readers (`status`, `top`, `paper`, `citations`) open one read transaction
//! each, so one `RankDatabase` can be shared between threads. `top` and
//! `citations` read only the rows they return: edges are stored in both
//! directions and nodes are additionally keyed by descending score.

use crate::export::{EdgeRow, ExportSink, NodeRow};
use crate::{CiteRankError, PaperDetails};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Table for nodes: external id -> serialized NodeRow bytes
const NODES: TableDefinition<&str, &[u8]> = TableDefinition::new("nodes");

/// Table for the index: internal index -> external id
const NODE_INDEX: TableDefinition<u64, &str> = TableDefinition::new("node_index");

/// Table for edges: (cited index, citing index), distinct pairs only
const EDGES: TableDefinition<(u64, u64), ()> = TableDefinition::new("edges");

/// Table for reversed edges: (citing index, cited index)
const REVERSE_EDGES: TableDefinition<(u64, u64), ()> = TableDefinition::new("reverse_edges");

/// Table for score order: (inverted score bits, internal index)
const RANK_ORDER: TableDefinition<(u64, u64), ()> = TableDefinition::new("rank_order");

/// Table for paper details: url -> serialized PaperDetails bytes
const PAPER_INFO: TableDefinition<&str, &[u8]> = TableDefinition::new("paper_info");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const META_NODE_COUNT: &str = "node_count";
const META_EDGE_COUNT: &str = "edge_count";
const META_DISTINCT_EDGE_COUNT: &str = "distinct_edge_count";
const META_DANGLING_COUNT: &str = "dangling_count";
const META_RANKED: &str = "ranked";

fn db_err(e: impl std::fmt::Display) -> CiteRankError {
    CiteRankError::DatabaseError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CiteRankError> {
    postcard::to_allocvec(value).map_err(|e| CiteRankError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CiteRankError> {
    postcard::from_bytes(bytes).map_err(|e| CiteRankError::SerializationError(e.to_string()))
}

/// Ascending key for descending scores.
///
/// Scores are non-negative, so their bit patterns order like the values.
/// Unranked rows map to `u64::MAX` and sort after every positive score.
fn rank_order_key(score: Option<f64>) -> u64 {
    match score {
        Some(score) => u64::MAX - score.max(0.0).to_bits(),
        None => u64::MAX,
    }
}

/// Resolve an internal index to its node row.
fn row_at(
    index_table: &impl ReadableTable<u64, &'static str>,
    nodes: &impl ReadableTable<&'static str, &'static [u8]>,
    index: u64,
) -> Result<Option<NodeRow>, CiteRankError> {
    let Some(external_id) = index_table.get(index).map_err(db_err)? else {
        return Ok(None);
    };
    match nodes.get(external_id.value()).map_err(db_err)? {
        Some(data) => Ok(Some(decode(data.value())?)),
        None => Ok(None),
    }
}

/// Node rows for every second key component in `(prefix, *)`.
fn rows_in_range(
    edges: &impl ReadableTable<(u64, u64), ()>,
    index_table: &impl ReadableTable<u64, &'static str>,
    nodes: &impl ReadableTable<&'static str, &'static [u8]>,
    prefix: u64,
) -> Result<Vec<NodeRow>, CiteRankError> {
    let mut rows = Vec::new();
    for entry in edges.range((prefix, 0)..=(prefix, u64::MAX)).map_err(db_err)? {
        let (key, _) = entry.map_err(db_err)?;
        if let Some(row) = row_at(index_table, nodes, key.value().1)? {
            rows.push(row);
        }
    }
    Ok(rows)
}

// =============================================================================
// READ MODELS
// =============================================================================

/// Summary of a stored ranking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatabaseStatus {
    pub node_count: u64,
    /// Recorded edges, duplicates included.
    pub edge_count: u64,
    pub distinct_edge_count: u64,
    pub dangling_count: u64,
    pub paper_info_count: u64,
    pub ranked: bool,
}

/// Citation neighbourhood of one paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citations {
    pub paper: NodeRow,
    /// Papers citing this one.
    pub cited_by: Vec<NodeRow>,
    /// Papers this one cites.
    pub references: Vec<NodeRow>,
}

// =============================================================================
// DATABASE
// =============================================================================

/// A rank database stored in a redb file.
pub struct RankDatabase {
    db: Database,
    pending_nodes: Vec<NodeRow>,
    pending_edges: Vec<EdgeRow>,
}

impl std::fmt::Debug for RankDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankDatabase")
            .field("pending_nodes", &self.pending_nodes.len())
            .field("pending_edges", &self.pending_edges.len())
            .finish_non_exhaustive()
    }
}

impl RankDatabase {
    /// Open or create a rank database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CiteRankError> {
        let db = Database::create(path.as_ref()).map_err(db_err)?;
        Self::init(db)
    }

    /// Open an existing rank database. Fails if the file is missing.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self, CiteRankError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CiteRankError::IoError(format!(
                "Database not found: {}",
                path.display()
            )));
        }
        let db = Database::open(path).map_err(db_err)?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, CiteRankError> {
        let write_txn = db.begin_write().map_err(db_err)?;
        write_txn.open_table(NODES).map_err(db_err)?;
        write_txn.open_table(NODE_INDEX).map_err(db_err)?;
        write_txn.open_table(EDGES).map_err(db_err)?;
        write_txn.open_table(REVERSE_EDGES).map_err(db_err)?;
        write_txn.open_table(RANK_ORDER).map_err(db_err)?;
        write_txn.open_table(PAPER_INFO).map_err(db_err)?;
        write_txn.open_table(METADATA).map_err(db_err)?;
        write_txn.commit().map_err(db_err)?;

        Ok(Self {
            db,
            pending_nodes: Vec::new(),
            pending_edges: Vec::new(),
        })
    }

    /// Store paper details, keeping the first row seen for each URL.
    ///
    /// Returns how many rows were new.
    pub fn store_details(&self, details: &[PaperDetails]) -> Result<usize, CiteRankError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let mut inserted = 0;
        {
            let mut table = write_txn.open_table(PAPER_INFO).map_err(db_err)?;
            for row in details {
                if table.get(row.url.as_str()).map_err(db_err)?.is_some() {
                    continue;
                }
                let bytes = encode(row)?;
                table.insert(row.url.as_str(), bytes.as_slice()).map_err(db_err)?;
                inserted += 1;
            }
        }
        write_txn.commit().map_err(db_err)?;
        Ok(inserted)
    }

    /// Details stored for a URL.
    pub fn details(&self, url: &str) -> Result<Option<PaperDetails>, CiteRankError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(PAPER_INFO).map_err(db_err)?;
        match table.get(url).map_err(db_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    /// Counts of the last stored run.
    pub fn status(&self) -> Result<DatabaseStatus, CiteRankError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let meta = read_txn.open_table(METADATA).map_err(db_err)?;
        let info = read_txn.open_table(PAPER_INFO).map_err(db_err)?;

        let get = |key: &str| -> Result<u64, CiteRankError> {
            Ok(meta.get(key).map_err(db_err)?.map(|v| v.value()).unwrap_or(0))
        };

        Ok(DatabaseStatus {
            node_count: get(META_NODE_COUNT)?,
            edge_count: get(META_EDGE_COUNT)?,
            distinct_edge_count: get(META_DISTINCT_EDGE_COUNT)?,
            dangling_count: get(META_DANGLING_COUNT)?,
            paper_info_count: info.len().map_err(db_err)?,
            ranked: get(META_RANKED)? == 1,
        })
    }

    /// Look up a paper by external id.
    pub fn paper(&self, external_id: &str) -> Result<Option<NodeRow>, CiteRankError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let nodes = read_txn.open_table(NODES).map_err(db_err)?;
        match nodes.get(external_id).map_err(db_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a paper by internal index.
    pub fn paper_at(&self, index: u64) -> Result<Option<NodeRow>, CiteRankError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let index_table = read_txn.open_table(NODE_INDEX).map_err(db_err)?;
        let nodes = read_txn.open_table(NODES).map_err(db_err)?;
        row_at(&index_table, &nodes, index)
    }

    /// The `limit` highest-ranked papers, descending; ties by lower index.
    ///
    /// Unranked papers sort last.
    pub fn top(&self, limit: usize) -> Result<Vec<NodeRow>, CiteRankError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let order = read_txn.open_table(RANK_ORDER).map_err(db_err)?;
        let index_table = read_txn.open_table(NODE_INDEX).map_err(db_err)?;
        let nodes = read_txn.open_table(NODES).map_err(db_err)?;

        let mut rows = Vec::with_capacity(limit.min(1024));
        for entry in order.iter().map_err(db_err)?.take(limit) {
            let (key, _) = entry.map_err(db_err)?;
            if let Some(row) = row_at(&index_table, &nodes, key.value().1)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// A paper with the papers citing it and the papers it cites.
    pub fn citations(&self, external_id: &str) -> Result<Option<Citations>, CiteRankError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let nodes = read_txn.open_table(NODES).map_err(db_err)?;
        let Some(paper) = nodes.get(external_id).map_err(db_err)? else {
            return Ok(None);
        };
        let paper: NodeRow = decode(paper.value())?;

        let index_table = read_txn.open_table(NODE_INDEX).map_err(db_err)?;
        let edges = read_txn.open_table(EDGES).map_err(db_err)?;
        let reverse = read_txn.open_table(REVERSE_EDGES).map_err(db_err)?;

        Ok(Some(Citations {
            cited_by: rows_in_range(&edges, &index_table, &nodes, paper.index)?,
            references: rows_in_range(&reverse, &index_table, &nodes, paper.index)?,
            paper,
        }))
    }

    fn commit_pending(&mut self) -> Result<(), CiteRankError> {
        let nodes = std::mem::take(&mut self.pending_nodes);
        let edges = std::mem::take(&mut self.pending_edges);

        let distinct: BTreeSet<(u64, u64)> = edges.iter().map(|e| (e.source, e.target)).collect();
        let sources: BTreeSet<u64> = distinct.iter().map(|&(source, _)| source).collect();
        let dangling = nodes.iter().filter(|n| !sources.contains(&n.index)).count();
        let ranked = !nodes.is_empty() && nodes.iter().all(|n| n.rank_score.is_some());

        let write_txn = self.db.begin_write().map_err(db_err)?;
        write_txn.delete_table(NODES).map_err(db_err)?;
        write_txn.delete_table(NODE_INDEX).map_err(db_err)?;
        write_txn.delete_table(EDGES).map_err(db_err)?;
        write_txn.delete_table(REVERSE_EDGES).map_err(db_err)?;
        write_txn.delete_table(RANK_ORDER).map_err(db_err)?;
        {
            let mut nodes_table = write_txn.open_table(NODES).map_err(db_err)?;
            let mut index_table = write_txn.open_table(NODE_INDEX).map_err(db_err)?;
            let mut order_table = write_txn.open_table(RANK_ORDER).map_err(db_err)?;
            for row in &nodes {
                let bytes = encode(row)?;
                nodes_table
                    .insert(row.external_id.as_str(), bytes.as_slice())
                    .map_err(db_err)?;
                index_table
                    .insert(row.index, row.external_id.as_str())
                    .map_err(db_err)?;
                order_table
                    .insert((rank_order_key(row.rank_score), row.index), ())
                    .map_err(db_err)?;
            }

            let mut edges_table = write_txn.open_table(EDGES).map_err(db_err)?;
            let mut reverse_table = write_txn.open_table(REVERSE_EDGES).map_err(db_err)?;
            for &(source, target) in &distinct {
                edges_table.insert((source, target), ()).map_err(db_err)?;
                reverse_table.insert((target, source), ()).map_err(db_err)?;
            }

            let mut meta = write_txn.open_table(METADATA).map_err(db_err)?;
            meta.insert(META_NODE_COUNT, nodes.len() as u64).map_err(db_err)?;
            meta.insert(META_EDGE_COUNT, edges.len() as u64).map_err(db_err)?;
            meta.insert(META_DISTINCT_EDGE_COUNT, distinct.len() as u64)
                .map_err(db_err)?;
            meta.insert(META_DANGLING_COUNT, dangling as u64).map_err(db_err)?;
            meta.insert(META_RANKED, u64::from(ranked)).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }
}

// =============================================================================
// EXPORT SINK
// =============================================================================

impl ExportSink for RankDatabase {
    fn begin(&mut self, node_count: usize, edge_count: usize) -> Result<(), CiteRankError> {
        self.pending_nodes = Vec::with_capacity(node_count);
        self.pending_edges = Vec::with_capacity(edge_count);
        Ok(())
    }

    fn write_node(&mut self, row: &NodeRow) -> Result<(), CiteRankError> {
        self.pending_nodes.push(row.clone());
        Ok(())
    }

    fn write_edge(&mut self, row: &EdgeRow) -> Result<(), CiteRankError> {
        self.pending_edges.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CiteRankError> {
        self.commit_pending()
    }
}

// =============================================================================
// TESTS
// =============================================================================
