//! # JSON Format
//!
//! One document holding every node row and edge row. Written on `finish`.

use crate::export::{EdgeRow, ExportSink, NodeRow};
use crate::CiteRankError;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Top-level JSON export document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonDocument {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<NodeRow>,
    pub edges: Vec<EdgeRow>,
}

/// Buffers rows and writes a [`JsonDocument`] when the export finishes.
#[derive(Debug)]
pub struct JsonWriter<W: Write> {
    out: W,
    pretty: bool,
    document: JsonDocument,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            pretty: false,
            document: JsonDocument::default(),
        }
    }

    /// Indented output.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ExportSink for JsonWriter<W> {
    fn begin(&mut self, node_count: usize, edge_count: usize) -> Result<(), CiteRankError> {
        self.document = JsonDocument {
            node_count,
            edge_count,
            nodes: Vec::with_capacity(node_count),
            edges: Vec::with_capacity(edge_count),
        };
        Ok(())
    }

    fn write_node(&mut self, row: &NodeRow) -> Result<(), CiteRankError> {
        self.document.nodes.push(row.clone());
        Ok(())
    }

    fn write_edge(&mut self, row: &EdgeRow) -> Result<(), CiteRankError> {
        self.document.edges.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CiteRankError> {
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, &self.document)
        } else {
            serde_json::to_writer(&mut self.out, &self.document)
        };
        result.map_err(|e| CiteRankError::SerializationError(e.to_string()))?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::export_graph;
    use crate::graph::Graph;
    use crate::PaperId;

    #[test]
    fn document_lists_rows() {
        let mut graph = Graph::new();
        graph.add_edge(&PaperId::new("A"), &PaperId::new("B")).expect("edge");

        let mut writer = JsonWriter::new(Vec::new());
        export_graph(&graph, &mut writer).expect("export");
        let bytes = writer.into_inner();

        let document: JsonDocument = serde_json::from_slice(&bytes).expect("parse");
        assert_eq!(document.node_count, 2);
        assert_eq!(document.edge_count, 1);
        assert_eq!(document.nodes[1].external_id, "B");
        assert_eq!(document.edges[0].source_id, "A");
        assert_eq!(document.nodes[0].rank_score, None);
    }

    #[test]
    fn pretty_output_is_indented() {
        let mut graph = Graph::new();
        graph.add_edge(&PaperId::new("A"), &PaperId::new("B")).expect("edge");

        let mut writer = JsonWriter::new(Vec::new()).pretty();
        export_graph(&graph, &mut writer).expect("export");
        let text = String::from_utf8(writer.into_inner()).expect("utf8");
        assert!(text.contains("\n  \"nodes\""));
    }
}
