//! # DOT Format
//!
//! Graphviz output for the citation network.
//!
//! ```text
//! digraph CitationNetwork {
//!   rankdir=LR;
//!   0 [label="Paper A", year="2017", citationCount="10", url="...", pageRank="1"];
//!   0 -> 1;
//! }
//! ```
//!
//! Nodes are named by internal index. `pageRank` is only written for ranked
//! nodes.

use crate::export::{EdgeRow, ExportSink, NodeRow};
use crate::CiteRankError;
use std::io::Write;

/// Streams export rows as a Graphviz digraph.
#[derive(Debug)]
pub struct DotWriter<W: Write> {
    out: W,
}

impl<W: Write> DotWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Escape a value for a double-quoted DOT attribute.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

impl<W: Write> ExportSink for DotWriter<W> {
    fn begin(&mut self, _node_count: usize, _edge_count: usize) -> Result<(), CiteRankError> {
        writeln!(self.out, "digraph CitationNetwork {{")?;
        writeln!(self.out, "  rankdir=LR;")?;
        Ok(())
    }

    fn write_node(&mut self, row: &NodeRow) -> Result<(), CiteRankError> {
        write!(
            self.out,
            "  {} [label=\"{}\", year=\"{}\", citationCount=\"{}\", url=\"{}\"",
            row.index,
            escape(&row.name),
            row.year,
            row.citation_count,
            escape(&row.url)
        )?;
        if let Some(score) = row.rank_score {
            write!(self.out, ", pageRank=\"{}\"", score)?;
        }
        writeln!(self.out, "];")?;
        Ok(())
    }

    fn write_edge(&mut self, row: &EdgeRow) -> Result<(), CiteRankError> {
        writeln!(self.out, "  {} -> {};", row.source, row.target)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CiteRankError> {
        writeln!(self.out, "}}")?;
        self.out.flush()?;
        Ok(())
    }
}
