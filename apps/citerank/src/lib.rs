//! # citerank
//!
//! CLI, input parsers and read-only HTTP API around `citerank-core`.
//!
//! The binary in `main.rs` only sets up tracing and dispatches to [`cli`];
//! everything else lives here so integration tests can reach it.

pub mod api;
pub mod cli;
pub mod config;
pub mod input;
