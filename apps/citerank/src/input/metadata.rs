//! Paper metadata CSV: `paperId,url,title,year,citationCount`, one header line.

use super::{Parsed, SkipLog, read_lines, split_csv_line};
use citerank_core::{CiteRankError, MetadataRecord, PaperId};
use std::io::BufRead;

const MIN_FIELDS: usize = 5;

/// Parse the metadata CSV.
///
/// The first line is a header. Rows with fewer than five fields or with a
/// year or citation count that is not an integer are skipped.
pub fn parse_metadata<R: BufRead>(reader: R) -> Result<Parsed<MetadataRecord>, CiteRankError> {
    let mut parsed = Parsed::default();
    let mut log = SkipLog::new("metadata");

    for (number, line) in read_lines(reader).enumerate().skip(1) {
        let line = line?;
        match parse_row(&line) {
            Ok(record) => parsed.accept(record),
            Err(reason) => {
                log.warn(number + 1, &reason);
                parsed.skip();
            }
        }
    }

    tracing::debug!(
        processed = parsed.report.processed,
        skipped = parsed.report.skipped,
        "Metadata parsed"
    );
    Ok(parsed)
}

fn parse_row(line: &str) -> Result<MetadataRecord, String> {
    let fields = split_csv_line(line);
    if fields.len() < MIN_FIELDS {
        return Err(format!("expected {} fields, found {}", MIN_FIELDS, fields.len()));
    }

    let year = fields[3]
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("year '{}': {}", fields[3], e))?;
    let citation_count = fields[4]
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("citation count '{}': {}", fields[4], e))?;

    Ok(MetadataRecord {
        paper: PaperId::new(fields[0].as_str()),
        url: fields[1].clone(),
        title: fields[2].replace("\"\"", " "),
        year,
        citation_count,
    })
}
