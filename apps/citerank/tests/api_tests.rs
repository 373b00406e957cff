//! Integration tests for the CiteRank HTTP API.
//!
//! Uses axum-test against a router over a temporary rank database.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await - tests touching env vars are serialized
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use citerank::api::{
    AppState, CitationsResponse, ErrorResponse, HealthResponse, PaperResponse, StatusResponse,
    TopResponse, create_router,
};
use citerank_core::{
    CitationRecord, Graph, Ingestor, MetadataRecord, PaperDetails, PaperId, RankDatabase,
    RankEngine, export_graph,
};
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes tests since the router reads env vars.
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

const ENV_VARS: [&str; 3] = ["CITERANK_API_KEY", "CITERANK_RATE_LIMIT", "CITERANK_CORS_ORIGINS"];

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Holds the env mutex and the database directory; clears env vars on drop.
struct TestGuard {
    _dir: TempDir,
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        clear_env();
    }
}

fn clear_env() {
    for var in ENV_VARS {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var(var) };
    }
}

fn metadata(id: &str, citations: u32) -> MetadataRecord {
    MetadataRecord {
        paper: PaperId::new(id),
        url: format!("https://example.org/{id}"),
        title: format!("Paper {id}"),
        year: 2018,
        citation_count: citations,
    }
}

/// A is cited by B and D, C stands alone. Ranked.
fn ranked_graph() -> Graph {
    let mut graph = Graph::new();
    Ingestor::ingest_metadata_batch(
        &mut graph,
        vec![metadata("A", 10), metadata("B", 0), metadata("C", 0)],
    )
    .unwrap();
    Ingestor::ingest_citation_batch(
        &mut graph,
        vec![
            CitationRecord::new("A", "B"),
            CitationRecord::new("A", "D").with_citing_details(Some("Paper D".to_string()), Some(2021)),
        ],
    )
    .unwrap();
    let ranking = RankEngine::default().rank(&graph);
    graph.apply_ranking(&ranking).unwrap();
    graph
}

/// Create a test server over a freshly built database, with the given env.
fn create_test_server(env: &[(&str, &str)]) -> (TestServer, TestGuard) {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    for (key, value) in env {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::set_var(key, value) };
    }

    let dir = tempfile::tempdir().unwrap();
    let mut db = RankDatabase::open(dir.path().join("rank.redb")).unwrap();
    export_graph(&ranked_graph(), &mut db).unwrap();
    db.store_details(&[PaperDetails {
        arxiv_id: "1706.03762".to_string(),
        url: "https://example.org/A".to_string(),
        title: "Paper A".to_string(),
        tldr: "A is cited.".to_string(),
        ..PaperDetails::default()
    }])
    .unwrap();

    let router = create_router(AppState::new(db));
    (
        TestServer::new(router).unwrap(),
        TestGuard {
            _dir: dir,
            _guard: guard,
        },
    )
}

// =============================================================================
// HEALTH + STATUS
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (server, _guard) = create_test_server(&[]);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_counts() {
    let (server, _guard) = create_test_server(&[]);

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.node_count, 4);
    assert_eq!(status.edge_count, 2);
    assert_eq!(status.paper_info_count, 1);
    assert!(status.ranked);
}

// =============================================================================
// PAPERS
// =============================================================================

#[tokio::test]
async fn test_top_orders_by_score() {
    let (server, _guard) = create_test_server(&[]);

    let response = server.get("/papers/top").add_query_param("limit", 2).await;

    response.assert_status_ok();
    let top: TopResponse = response.json();
    assert_eq!(top.limit, 2);
    assert_eq!(top.papers.len(), 2);
    assert_eq!(top.papers[0].id, "A");
    assert_eq!(top.papers[0].rank, Some(1.0));
    assert!(top.papers[1].rank.unwrap() <= 1.0);
}

#[tokio::test]
async fn test_top_limit_is_capped() {
    let (server, _guard) = create_test_server(&[]);

    let response = server.get("/papers/top").add_query_param("limit", 100_000).await;

    response.assert_status_ok();
    let top: TopResponse = response.json();
    assert_eq!(top.limit, 1000);
    assert_eq!(top.papers.len(), 4);
}

#[tokio::test]
async fn test_paper_with_details() {
    let (server, _guard) = create_test_server(&[]);

    let response = server.get("/papers/A").await;

    response.assert_status_ok();
    let paper: PaperResponse = response.json();
    assert_eq!(paper.paper.title, "Paper A");
    assert_eq!(paper.paper.citation_count, 10);
    assert_eq!(paper.details.unwrap().arxiv_id, "1706.03762");
}

#[tokio::test]
async fn test_placeholder_paper_has_no_details() {
    let (server, _guard) = create_test_server(&[]);

    let response = server.get("/papers/D").await;

    response.assert_status_ok();
    let paper: PaperResponse = response.json();
    assert_eq!(paper.paper.title, "Paper D");
    assert_eq!(paper.paper.year, 2021);
    assert!(paper.details.is_none());
}

#[tokio::test]
async fn test_unknown_paper_is_not_found() {
    let (server, _guard) = create_test_server(&[]);

    let response = server.get("/papers/missing").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("missing"));
}

#[tokio::test]
async fn test_citations_neighbourhood() {
    let (server, _guard) = create_test_server(&[]);

    let response = server.get("/papers/A/citations").await;

    response.assert_status_ok();
    let citations: CitationsResponse = response.json();
    let citing: Vec<&str> = citations.cited_by.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(citing, vec!["B", "D"]);
    assert!(citations.references.is_empty());

    let response = server.get("/papers/B/citations").await;
    let citations: CitationsResponse = response.json();
    assert!(citations.cited_by.is_empty());
    assert_eq!(citations.references[0].id, "A");
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let (server, _guard) = create_test_server(&[("CITERANK_API_KEY", "test-secret-key-12345")]);

    let response = server
        .get("/status")
        .add_header(
            header::AUTHORIZATION,
            "Bearer test-secret-key-12345".parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let (server, _guard) = create_test_server(&[("CITERANK_API_KEY", "correct-key")]);

    let response = server
        .get("/papers/top")
        .add_header(
            header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let (server, _guard) = create_test_server(&[("CITERANK_API_KEY", "correct-key")]);

    let response = server.get("/papers/A").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_health_always_allowed() {
    let (server, _guard) = create_test_server(&[("CITERANK_API_KEY", "correct-key")]);

    let response = server.get("/health").await;

    response.assert_status_ok();
}

// =============================================================================
// RATE LIMITING
// =============================================================================

#[tokio::test]
async fn test_rate_limit_rejects_burst() {
    let (server, _guard) = create_test_server(&[("CITERANK_RATE_LIMIT", "1")]);

    server.get("/health").await.assert_status_ok();
    let response = server.get("/health").await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_disabled_with_zero() {
    let (server, _guard) = create_test_server(&[("CITERANK_RATE_LIMIT", "0")]);

    for _ in 0..5 {
        server.get("/health").await.assert_status_ok();
    }
}
