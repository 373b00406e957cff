//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::ExportFormat;
use crate::api;
use crate::config::CiteRankConfig;
use crate::input::{parse_citations, parse_details, parse_metadata};
use citerank_core::{
    CiteRankError, DotWriter, ExportSink, Graph, IngestReport, Ingestor, JsonWriter,
    RankDatabase, RankEngine, Ranking, SharedGraph, export_graph, graph_from_snapshot,
    graph_to_snapshot, primitives::MAX_SNAPSHOT_SIZE,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

// =============================================================================
// PATH VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CiteRankError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CiteRankError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(CiteRankError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and ensure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CiteRankError> {
    let canonical = path.canonicalize().map_err(|e| {
        CiteRankError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CiteRankError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against its canonical parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, CiteRankError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        CiteRankError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(CiteRankError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| CiteRankError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn open_input(path: &Path) -> Result<BufReader<File>, CiteRankError> {
    let path = validate_file_path(path)?;
    Ok(BufReader::new(File::open(path)?))
}

fn create_output(path: &Path) -> Result<BufWriter<File>, CiteRankError> {
    let path = validate_output_path(path)?;
    Ok(BufWriter::new(File::create(path)?))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SHARED STEPS
// =============================================================================

/// Export `graph` as DOT to `path`.
fn write_dot(graph: &Graph, path: &Path) -> Result<(), CiteRankError> {
    let mut writer = DotWriter::new(create_output(path)?);
    export_graph(graph, &mut writer)?;
    tracing::info!("Graph written to {}", path.display());
    Ok(())
}

fn write_snapshot(graph: &Graph, path: &Path) -> Result<(), CiteRankError> {
    let bytes = graph_to_snapshot(graph)?;
    let mut out = create_output(path)?;
    out.write_all(&bytes)?;
    out.flush()?;
    tracing::info!(bytes = bytes.len(), "Snapshot written to {}", path.display());
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<Graph, CiteRankError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_SNAPSHOT_SIZE as u64)?;
    graph_from_snapshot(&std::fs::read(&path)?)
}

/// Export `graph` into the rank database at `path`.
fn write_database(graph: &Graph, path: &Path) -> Result<RankDatabase, CiteRankError> {
    let mut db = RankDatabase::open(path)?;
    export_graph(graph, &mut db)?;
    tracing::info!("Rank database written to {}", path.display());
    Ok(db)
}

/// Rank `graph` with the configured engine and log the iteration trace.
fn rank_graph(graph: &Graph, config: &CiteRankConfig) -> Result<Ranking, CiteRankError> {
    let engine = RankEngine::new(config.rank)?;
    let ranking = engine.rank(graph);
    let report = ranking.report();

    for (iteration, diff) in report.diffs.iter().enumerate() {
        tracing::debug!(iteration = iteration + 1, diff, "Rank iteration");
    }
    if report.converged {
        tracing::info!(iterations = report.iterations, "Ranking converged");
    } else if !ranking.is_empty() {
        tracing::warn!(
            iterations = report.iterations,
            final_diff = report.final_diff,
            "Ranking stopped at the iteration cap without converging"
        );
    }
    tracing::info!(
        min = report.min_score,
        max = report.max_score,
        dangling = report.dangling_count,
        "Rank scores"
    );
    Ok(ranking)
}

fn seconds(duration: Duration) -> f64 {
    duration.as_secs_f64()
}

// =============================================================================
// BUILD COMMAND
// =============================================================================

/// Parse the inputs, build and rank the graph, and write every output.
///
/// Order: metadata, citations, unranked DOT, ranking, ranked DOT, snapshot,
/// rank database, paper details.
pub fn cmd_build(config: &CiteRankConfig, parallel: bool, json_mode: bool) -> Result<(), CiteRankError> {
    let total_start = Instant::now();

    // Graph construction: metadata strictly before citations.
    let build_start = Instant::now();
    let metadata = parse_metadata(open_input(&config.input.metadata)?)?;
    let mut graph = Graph::new();
    let metadata_report = Ingestor::ingest_metadata_batch(&mut graph, metadata.records)?
        .merge(IngestReport {
            processed: 0,
            skipped: metadata.report.skipped,
        });
    tracing::info!(
        processed = metadata_report.processed,
        skipped = metadata_report.skipped,
        "Metadata ingested"
    );

    let citations = parse_citations(open_input(&config.input.citations)?)?;
    let ingested = if parallel {
        let shared = SharedGraph::new(graph);
        let report = Ingestor::ingest_citations_parallel(&shared, &citations.records)?;
        graph = shared.into_inner()?;
        report
    } else {
        Ingestor::ingest_citation_batch(&mut graph, citations.records)?
    };
    let citation_report = ingested.merge(IngestReport {
        processed: 0,
        skipped: citations.report.skipped,
    });
    tracing::info!(
        processed = citation_report.processed,
        skipped = citation_report.skipped,
        parallel,
        "Citations ingested"
    );

    let stats = graph.stats();
    let build_time = build_start.elapsed();
    tracing::info!(
        nodes = stats.node_count,
        edges = stats.edge_count,
        placeholders = stats.placeholder_count,
        dangling = stats.dangling_count,
        seconds = seconds(build_time),
        "Graph built"
    );

    let mut dot_time = Duration::ZERO;
    let dot_start = Instant::now();
    write_dot(&graph, &config.output.dot)?;
    dot_time += dot_start.elapsed();

    let rank_start = Instant::now();
    let ranking = rank_graph(&graph, config)?;
    graph.apply_ranking(&ranking)?;
    let rank_time = rank_start.elapsed();
    tracing::info!(seconds = seconds(rank_time), "Ranking finished");

    let dot_start = Instant::now();
    write_dot(&graph, &config.output.ranked_dot)?;
    dot_time += dot_start.elapsed();
    tracing::info!(seconds = seconds(dot_time), "DOT files written");

    write_snapshot(&graph, &config.output.snapshot)?;

    let db_start = Instant::now();
    let db = write_database(&graph, &config.output.database)?;
    let details_report = match &config.input.details {
        Some(path) => {
            let details = parse_details(open_input(path)?)?;
            let stored = db.store_details(&details.records)?;
            tracing::info!(
                parsed = details.report.processed,
                skipped = details.report.skipped,
                stored,
                "Paper details stored"
            );
            Some((details.report, stored))
        }
        None => None,
    };
    let db_time = db_start.elapsed();
    tracing::info!(seconds = seconds(db_time), "Database written");

    let total_time = total_start.elapsed();
    tracing::info!(seconds = seconds(total_time), "Build complete");

    let report = ranking.report();
    if json_mode {
        let output = serde_json::json!({
            "metadata": metadata_report,
            "citations": citation_report,
            "details": details_report.map(|(report, stored)| serde_json::json!({
                "processed": report.processed,
                "skipped": report.skipped,
                "stored": stored,
            })),
            "graph": stats,
            "rank": {
                "iterations": report.iterations,
                "converged": report.converged,
                "final_diff": report.final_diff,
                "min_score": report.min_score,
                "max_score": report.max_score,
            },
            "timings": {
                "graph_build_seconds": seconds(build_time),
                "rank_seconds": seconds(rank_time),
                "dot_seconds": seconds(dot_time),
                "database_seconds": seconds(db_time),
                "total_seconds": seconds(total_time),
            }
        });
        print_json(&output);
        return Ok(());
    }

    println!("CiteRank Build");
    println!("==============");
    println!(
        "Metadata:   {} processed, {} skipped",
        metadata_report.processed, metadata_report.skipped
    );
    println!(
        "Citations:  {} processed, {} skipped",
        citation_report.processed, citation_report.skipped
    );
    if let Some((details, stored)) = details_report {
        println!(
            "Details:    {} parsed, {} skipped, {} stored",
            details.processed, details.skipped, stored
        );
    }
    println!();
    println!("Nodes:        {}", stats.node_count);
    println!("Edges:        {}", stats.edge_count);
    println!("Placeholders: {}", stats.placeholder_count);
    println!("Dangling:     {}", stats.dangling_count);
    println!(
        "Iterations:   {} ({})",
        report.iterations,
        if report.converged { "converged" } else { "capped" }
    );
    println!();
    println!("Graph build time: {:.3} s", seconds(build_time));
    println!("Rank time:        {:.3} s", seconds(rank_time));
    println!("DOT write time:   {:.3} s", seconds(dot_time));
    println!("Database time:    {:.3} s", seconds(db_time));
    println!("Total time:       {:.3} s", seconds(total_time));

    Ok(())
}

// =============================================================================
// RANK COMMAND
// =============================================================================

/// Re-rank the stored snapshot and rewrite the ranked DOT, snapshot and
/// database. Stored paper details are kept.
pub fn cmd_rank(config: &CiteRankConfig, json_mode: bool) -> Result<(), CiteRankError> {
    let start = Instant::now();
    let mut graph = load_snapshot(&config.output.snapshot)?.unranked()?;
    tracing::info!(nodes = graph.len(), "Snapshot loaded");

    let ranking = rank_graph(&graph, config)?;
    graph.apply_ranking(&ranking)?;

    write_dot(&graph, &config.output.ranked_dot)?;
    write_snapshot(&graph, &config.output.snapshot)?;
    write_database(&graph, &config.output.database)?;

    let report = ranking.report();
    if json_mode {
        print_json(&serde_json::json!({
            "nodes": graph.len(),
            "iterations": report.iterations,
            "converged": report.converged,
            "final_diff": report.final_diff,
            "seconds": seconds(start.elapsed()),
        }));
        return Ok(());
    }

    println!(
        "Ranked {} papers in {} iterations ({}) in {:.3} s",
        graph.len(),
        report.iterations,
        if report.converged { "converged" } else { "capped" },
        seconds(start.elapsed())
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show rank database status.
pub fn cmd_status(db_path: &Path, json_mode: bool) -> Result<(), CiteRankError> {
    let db = RankDatabase::open_existing(db_path)?;
    let status = db.status()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "node_count": status.node_count,
            "edge_count": status.edge_count,
            "distinct_edge_count": status.distinct_edge_count,
            "dangling_count": status.dangling_count,
            "paper_info_count": status.paper_info_count,
            "ranked": status.ranked,
        }));
        return Ok(());
    }

    println!("CiteRank Status");
    println!("===============");
    println!("Database: {:?}", db_path);
    println!();
    println!("Nodes:          {}", status.node_count);
    println!("Edges:          {}", status.edge_count);
    println!("Distinct Edges: {}", status.distinct_edge_count);
    println!("Dangling:       {}", status.dangling_count);
    println!("Paper Details:  {}", status.paper_info_count);
    println!("Ranked:         {}", status.ranked);

    Ok(())
}

// =============================================================================
// TOP COMMAND
// =============================================================================

/// List the `limit` highest-ranked papers.
pub fn cmd_top(db_path: &Path, limit: usize, json_mode: bool) -> Result<(), CiteRankError> {
    let db = RankDatabase::open_existing(db_path)?;
    let papers = db.top(limit)?;

    if json_mode {
        print_json(&serde_json::json!({ "papers": papers }));
        return Ok(());
    }

    for (position, paper) in papers.iter().enumerate() {
        let score = paper
            .rank_score
            .map(|s| format!("{:.6}", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}. {}  {}  {} ({})",
            position + 1,
            score,
            paper.external_id,
            paper.name,
            paper.year
        );
    }
    Ok(())
}

// =============================================================================
// PAPER COMMAND
// =============================================================================

/// Show one paper with its stored details and citation neighbourhood.
pub fn cmd_paper(db_path: &Path, id: &str, json_mode: bool) -> Result<(), CiteRankError> {
    let db = RankDatabase::open_existing(db_path)?;

    let Some(citations) = db.citations(id)? else {
        if json_mode {
            print_json(&serde_json::json!({ "found": false, "id": id }));
        } else {
            println!("Paper not found: {}", id);
        }
        return Ok(());
    };
    let details = db.details(&citations.paper.url)?;

    if json_mode {
        print_json(&serde_json::json!({
            "found": true,
            "paper": citations.paper,
            "details": details,
            "cited_by": citations.cited_by,
            "references": citations.references,
        }));
        return Ok(());
    }

    let paper = &citations.paper;
    println!("{}", paper.name);
    println!("  id:         {}", paper.external_id);
    println!("  url:        {}", paper.url);
    println!("  year:       {}", paper.year);
    println!("  citations:  {}", paper.citation_count);
    if let Some(score) = paper.rank_score {
        println!("  rank:       {:.6}", score);
    }
    if let Some(details) = details {
        if !details.arxiv_id.is_empty() {
            println!("  arxiv:      {}", details.arxiv_id);
        }
        if !details.tldr.is_empty() {
            println!("  tldr:       {}", details.tldr);
        }
    }
    println!();
    println!("Cited by {} papers:", citations.cited_by.len());
    for citing in &citations.cited_by {
        println!("  {}  {}", citing.external_id, citing.name);
    }
    println!("References {} papers:", citations.references.len());
    for cited in &citations.references {
        println!("  {}  {}", cited.external_id, cited.name);
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export a snapshot as DOT or JSON, to a file or stdout.
pub fn cmd_export(snapshot: &Path, format: ExportFormat, output: Option<&Path>) -> Result<(), CiteRankError> {
    let graph = load_snapshot(snapshot)?;

    let out: Box<dyn Write> = match output {
        Some(path) => Box::new(create_output(path)?),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut sink: Box<dyn ExportSink> = match format {
        ExportFormat::Dot => Box::new(DotWriter::new(out)),
        ExportFormat::Json => Box::new(JsonWriter::new(out).pretty()),
    };
    export_graph(&graph, sink.as_mut())?;

    if let Some(path) = output {
        tracing::info!(
            nodes = graph.len(),
            format = ?format,
            "Exported to {}",
            path.display()
        );
    }
    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the read-only HTTP server.
pub async fn cmd_serve(db_path: &Path, host: &str, port: u16) -> Result<(), CiteRankError> {
    let db = RankDatabase::open_existing(db_path)?;

    println!("CiteRank Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Database: {:?}", db_path);
    println!();
    println!("Endpoints:");
    println!("  GET /health                 - Health check");
    println!("  GET /status                 - Database status");
    println!("  GET /papers/top?limit=N     - Top ranked papers");
    println!("  GET /papers/{{id}}            - One paper");
    println!("  GET /papers/{{id}}/citations  - Citation neighbourhood");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, db).await
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const METADATA: &str = "paperId,url,title,year,citationCount\n\
        A,https://example.org/A,Paper A,2017,10\n\
        B,https://example.org/B,Paper B,2018,0\n\
        C,https://example.org/C,Paper C,2019,0\n\
        ,https://example.org/empty,No Id,2019,0\n";

    const CITATIONS: &str = "{\"citedPaperId\":\"A\",\"citingPaper\":{\"paperId\":\"B\",\"title\":\"Paper B\",\"year\":2018}}\n\
        {\"citedPaperId\":\"A\",\"citingPaper\":{\"paperId\":\"D\",\"title\":\"Paper D\",\"year\":2021}}\n\
        not json\n";

    const DETAILS: &str = "i,j,arxiv_id,citationCount,year,semantic_id,url,title,published_date,abstract,tldr\n\
        0,0,1234.5678,10,2017,A,https://example.org/A,Paper A,2017-01-01,Abstract A,TLDR A\n";

    fn build_config(dir: &Path) -> CiteRankConfig {
        std::fs::write(dir.join("metadata.csv"), METADATA).expect("write");
        std::fs::write(dir.join("citations.jsonl"), CITATIONS).expect("write");
        std::fs::write(dir.join("details.csv"), DETAILS).expect("write");

        let mut config = CiteRankConfig::default();
        config.input.metadata = dir.join("metadata.csv");
        config.input.citations = dir.join("citations.jsonl");
        config.input.details = Some(dir.join("details.csv"));
        config.output.dot = dir.join("graph.dot");
        config.output.ranked_dot = dir.join("graph_ranked.dot");
        config.output.snapshot = dir.join("graph.snapshot");
        config.output.database = dir.join("rank.redb");
        config
    }

    #[test]
    fn output_path_without_parent_uses_current_dir() {
        let resolved = validate_output_path(Path::new("out.dot")).expect("valid");
        assert_eq!(resolved.file_name().and_then(|n| n.to_str()), Some("out.dot"));
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = tempdir().expect("temp dir");
        let result = open_input(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(CiteRankError::IoError(_))));
    }

    #[test]
    fn build_writes_every_output() {
        let dir = tempdir().expect("temp dir");
        let config = build_config(dir.path());

        cmd_build(&config, false, true).expect("build");

        let before = std::fs::read_to_string(&config.output.dot).expect("dot");
        assert!(before.starts_with("digraph CitationNetwork {"));
        assert!(!before.contains("pageRank"));
        let after = std::fs::read_to_string(&config.output.ranked_dot).expect("ranked dot");
        assert_eq!(after.matches("pageRank=").count(), 4);

        let graph = load_snapshot(&config.output.snapshot).expect("snapshot");
        assert!(graph.is_ranked());
        assert_eq!(graph.len(), 4);

        let db = RankDatabase::open_existing(&config.output.database).expect("db");
        let status = db.status().expect("status");
        assert_eq!(status.node_count, 4);
        assert_eq!(status.edge_count, 2);
        assert_eq!(status.paper_info_count, 1);
        assert_eq!(db.top(1).expect("top")[0].external_id, "A");
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let sequential = tempdir().expect("temp dir");
        let parallel = tempdir().expect("temp dir");
        let config_a = build_config(sequential.path());
        let config_b = build_config(parallel.path());

        cmd_build(&config_a, false, true).expect("build");
        cmd_build(&config_b, true, true).expect("build");

        let a = load_snapshot(&config_a.output.snapshot).expect("snapshot");
        let b = load_snapshot(&config_b.output.snapshot).expect("snapshot");
        for node in a.nodes() {
            let other = b.lookup(&node.paper).expect("same papers");
            let (x, y) = (node.rank.expect("ranked"), other.rank.expect("ranked"));
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn rank_rewrites_snapshot_with_new_damping() {
        let dir = tempdir().expect("temp dir");
        let mut config = build_config(dir.path());
        cmd_build(&config, false, true).expect("build");
        let first = std::fs::read(&config.output.snapshot).expect("read");

        config.rank.damping = 0.5;
        cmd_rank(&config, true).expect("rank");
        let second = std::fs::read(&config.output.snapshot).expect("read");
        assert_ne!(first, second);

        let db = RankDatabase::open_existing(&config.output.database).expect("db");
        assert_eq!(db.status().expect("status").paper_info_count, 1);
    }

    #[test]
    fn export_json_to_file() {
        let dir = tempdir().expect("temp dir");
        let config = build_config(dir.path());
        cmd_build(&config, false, true).expect("build");

        let out = dir.path().join("graph.json");
        cmd_export(&config.output.snapshot, ExportFormat::Json, Some(&out)).expect("export");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).expect("read")).expect("json");
        assert_eq!(value["node_count"], 4);
        assert_eq!(value["edges"][0]["source_id"], "A");
    }
}
