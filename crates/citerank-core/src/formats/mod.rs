//! # Formats
//!
//! Serialization formats for CiteRank graphs.
//!
//! - `dot`: Graphviz digraph, written through the export sink
//! - `json`: node and edge rows as one JSON document
//! - `snapshot`: versioned binary snapshot (header + postcard payload)
//!
//! These are pure transformations over `std::io::Write` or byte slices.
//! Opening files is the app layer's job.

pub mod dot;
pub mod json;
pub mod snapshot;

pub use dot::DotWriter;
pub use json::{JsonDocument, JsonWriter};
pub use snapshot::{SnapshotHeader, graph_from_snapshot, graph_to_snapshot};
