//! # CiteRank - Citation Network Ranking
//!
//! The main binary for the CiteRank citation graph.
//!
//! This application provides:
//! - CLI interface for building, ranking and exporting a citation graph
//! - HTTP REST API server (axum-based, read-only)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 apps/citerank (THE BINARY)               │
//! │                                                          │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐   │
//! │  │   Input     │    │   CLI       │    │  HTTP API   │   │
//! │  │ (CSV/JSONL) │    │  (clap)     │    │  (axum)     │   │
//! │  └──────┬──────┘    └──────┬──────┘    └──────┬──────┘   │
//! │         └──────────────────┼──────────────────┘          │
//! │                            ▼                             │
//! │                    ┌───────────────┐                     │
//! │                    │ citerank-core │                     │
//! │                    │  (THE LOGIC)  │                     │
//! │                    └───────────────┘                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Build, rank and persist the citation network
//! citerank build --metadata data/paper_metadata.csv --citations data/citations.jsonl
//!
//! # Inspect the result
//! citerank top --limit 20
//! citerank paper --id 204e3073870fae3d05bcbc2f6a8e263d9b72e776
//!
//! # Serve it
//! citerank serve --port 8080
//! ```

use citerank::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments first so --verbose can raise the default level.
    let cli = cli::Cli::parse();

    // CITERANK_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CITERANK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "citerank=debug,citerank_core=debug,tower_http=debug"
    } else {
        "citerank=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the CiteRank startup banner.
fn print_banner() {
    println!(
        r#"
  CiteRank v{}
  Citation network builder and ranker
"#,
        env!("CARGO_PKG_VERSION")
    );
}
