//! # Storage
//!
//! Persistent rank database backed by redb.

pub mod redb_store;

pub use redb_store::{Citations, DatabaseStatus, RankDatabase};
