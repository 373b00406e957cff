//! # Record Input
//!
//! Turns the three raw sources into core records:
//! - `metadata` - paper metadata CSV into [`MetadataRecord`](citerank_core::MetadataRecord)
//! - `citations` - citation JSONL into [`CitationRecord`](citerank_core::CitationRecord)
//! - `details` - paper details CSV into [`PaperDetails`](citerank_core::PaperDetails)
//!
//! Parsers read any `BufRead`, skip and count malformed lines, and only fail
//! on I/O errors. Invalid UTF-8 is replaced rather than rejected.

mod citations;
mod details;
mod metadata;

pub use citations::parse_citations;
pub use details::parse_details;
pub use metadata::parse_metadata;

use citerank_core::IngestReport;
use std::io::BufRead;

/// Lines between progress log entries.
pub const PROGRESS_INTERVAL: usize = 100_000;

/// Conversion warnings logged per source before the rest are suppressed.
const MAX_LOGGED_ERRORS: usize = 10;

// =============================================================================
// PARSED OUTPUT
// =============================================================================

/// Records parsed from one source, with the lines accounted for.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub report: IngestReport,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            report: IngestReport::default(),
        }
    }
}

impl<T> Parsed<T> {
    fn accept(&mut self, record: T) {
        self.records.push(record);
        self.report.processed += 1;
    }

    fn skip(&mut self) {
        self.report.skipped += 1;
    }
}

// =============================================================================
// LINE READING
// =============================================================================

/// Iterate over the lines of a reader, decoding lossily and dropping a
/// trailing `\r`.
pub(crate) fn read_lines<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<String, citerank_core::CiteRankError>> {
    reader.split(b'\n').map(|line| {
        let mut line = String::from_utf8_lossy(&line?).into_owned();
        if line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    })
}

/// Rate-limited warning log for skipped lines.
#[derive(Debug)]
pub(crate) struct SkipLog {
    source: &'static str,
    logged: usize,
}

impl SkipLog {
    pub(crate) fn new(source: &'static str) -> Self {
        Self { source, logged: 0 }
    }

    pub(crate) fn warn(&mut self, line: usize, reason: &str) {
        if self.logged < MAX_LOGGED_ERRORS {
            tracing::warn!(source = self.source, line, "Skipping line: {}", reason);
        } else if self.logged == MAX_LOGGED_ERRORS {
            tracing::warn!(source = self.source, "Suppressing further skipped-line warnings");
        }
        self.logged += 1;
    }
}

// =============================================================================
// CSV FIELDS
// =============================================================================

/// Split one CSV line on commas, honouring double-quoted fields.
///
/// A piece that opens with `"` but does not close with one starts a quoted
/// field; following pieces are joined back with commas until one ends with
/// `"`. Surrounding quotes are stripped from quoted fields. A quoted field
/// still open at the end of the line is dropped.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut quoted: Option<String> = None;

    for piece in line.split(',') {
        match quoted.take() {
            Some(mut open) => {
                open.push(',');
                open.push_str(piece);
                if piece.ends_with('"') {
                    fields.push(strip_quotes(&open).to_string());
                } else {
                    quoted = Some(open);
                }
            }
            None if piece.starts_with('"') && !piece.ends_with('"') => {
                quoted = Some(piece.to_string());
            }
            None => fields.push(strip_quotes(piece).to_string()),
        }
    }

    fields
}

/// Remove one pair of surrounding double quotes, if present.
///
/// A lone `"` strips to the empty string.
pub fn strip_quotes(field: &str) -> &str {
    if field == "\"" {
        return "";
    }
    field
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(field)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields() {
        assert_eq!(split_csv_line("a,b,,c"), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn quoted_field_with_commas() {
        let fields = split_csv_line(r#"p1,"Deep, Wide, Nets",2019"#);
        assert_eq!(fields, vec!["p1", "Deep, Wide, Nets", "2019"]);
    }

    #[test]
    fn fully_quoted_field_is_unwrapped() {
        assert_eq!(split_csv_line(r#""x","y""#), vec!["x", "y"]);
    }

    #[test]
    fn lone_quote_is_empty_field() {
        assert_eq!(split_csv_line(r#"a,",b"#), vec!["a", "", "b"]);
    }

    #[test]
    fn unterminated_quote_is_dropped() {
        assert_eq!(split_csv_line(r#"a,"open,tail"#), vec!["a"]);
    }

    #[test]
    fn lines_lose_carriage_returns() {
        let lines: Vec<String> = read_lines(&b"one\r\ntwo\n"[..])
            .collect::<Result<_, _>>()
            .expect("read");
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let lines: Vec<String> = read_lines(&b"ok\xff\n"[..])
            .collect::<Result<_, _>>()
            .expect("read");
        assert_eq!(lines, vec!["ok\u{fffd}"]);
    }
}
