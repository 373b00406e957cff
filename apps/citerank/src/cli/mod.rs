//! # CiteRank CLI Module
//!
//! This module implements the CLI interface for CiteRank.
//!
//! ## Available Commands
//!
//! - `build` - Parse inputs, build and rank the graph, write every output
//! - `rank` - Re-rank a stored snapshot and rewrite the ranked outputs
//! - `status` - Show rank database counts
//! - `top` - List the highest-ranked papers
//! - `paper` - Show one paper with its details and citations
//! - `export` - Export a snapshot as DOT or JSON
//! - `serve` - Start the read-only HTTP server

mod commands;

use crate::config::CiteRankConfig;
use citerank_core::{CiteRankError, RankConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// CiteRank - citation network builder and ranker
///
/// Builds a citation graph from paper metadata and citation records, ranks
/// every paper by citation-biased power iteration, and serves the result.
#[derive(Parser, Debug)]
#[command(name = "citerank")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./citerank.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the rank database (overrides config and CITERANK_DB)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Ranking overrides shared by `build` and `rank`.
#[derive(Args, Debug, Clone, Default)]
pub struct RankArgs {
    /// Damping factor, in (0, 1)
    #[arg(long)]
    pub damping: Option<f64>,

    /// Iteration cap
    #[arg(long)]
    pub max_iterations: Option<usize>,
}

impl RankArgs {
    /// Write the given overrides into `config` and re-validate it.
    pub fn apply(&self, config: &mut RankConfig) -> Result<(), CiteRankError> {
        if let Some(damping) = self.damping {
            config.damping = damping;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        config.validate()
    }
}

/// Export file formats.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Graphviz digraph
    Dot,
    /// JSON document of node and edge rows
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, rank and persist the citation network
    Build {
        /// Paper metadata CSV
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Citation JSONL
        #[arg(long)]
        citations: Option<PathBuf>,

        /// Paper details CSV to store alongside the ranking
        #[arg(long)]
        details: Option<PathBuf>,

        /// DOT output of the unranked graph
        #[arg(long)]
        dot: Option<PathBuf>,

        /// DOT output of the ranked graph
        #[arg(long)]
        ranked_dot: Option<PathBuf>,

        /// Snapshot output
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Ingest citations on the rayon thread pool
        #[arg(long)]
        parallel: bool,

        #[command(flatten)]
        rank: RankArgs,
    },

    /// Re-rank a stored snapshot and rewrite the ranked outputs
    Rank {
        /// Snapshot to rank
        #[arg(long)]
        snapshot: Option<PathBuf>,

        #[command(flatten)]
        rank: RankArgs,
    },

    /// Show rank database status
    Status,

    /// List the highest-ranked papers
    Top {
        /// Number of papers
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Show one paper with its details and citations
    Paper {
        /// External paper id
        #[arg(long)]
        id: String,
    },

    /// Export a snapshot
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value = "dot")]
        format: ExportFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Snapshot to export
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Start the read-only HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CiteRankError> {
    let mut config = CiteRankConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.output.database = database;
    }
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Build {
            metadata,
            citations,
            details,
            dot,
            ranked_dot,
            snapshot,
            parallel,
            rank,
        }) => {
            if let Some(path) = metadata {
                config.input.metadata = path;
            }
            if let Some(path) = citations {
                config.input.citations = path;
            }
            if details.is_some() {
                config.input.details = details;
            }
            if let Some(path) = dot {
                config.output.dot = path;
            }
            if let Some(path) = ranked_dot {
                config.output.ranked_dot = path;
            }
            if let Some(path) = snapshot {
                config.output.snapshot = path;
            }
            rank.apply(&mut config.rank)?;
            cmd_build(&config, parallel, json_mode)
        }
        Some(Commands::Rank { snapshot, rank }) => {
            if let Some(path) = snapshot {
                config.output.snapshot = path;
            }
            rank.apply(&mut config.rank)?;
            cmd_rank(&config, json_mode)
        }
        Some(Commands::Status) => cmd_status(&config.output.database, json_mode),
        Some(Commands::Top { limit }) => cmd_top(&config.output.database, limit, json_mode),
        Some(Commands::Paper { id }) => cmd_paper(&config.output.database, &id, json_mode),
        Some(Commands::Export {
            format,
            output,
            snapshot,
        }) => {
            let snapshot = snapshot.unwrap_or_else(|| config.output.snapshot.clone());
            cmd_export(&snapshot, format, output.as_deref())
        }
        Some(Commands::Serve { host, port }) => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            cmd_serve(&config.output.database, &host, port).await
        }
        None => cmd_status(&config.output.database, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
