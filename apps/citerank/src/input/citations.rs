//! Citation JSONL: one object per line,
//! `{"citedPaperId": "...", "citingPaper": {"paperId": "...", "title": "...", "year": 2020}}`.

use super::{PROGRESS_INTERVAL, Parsed, SkipLog, read_lines};
use citerank_core::primitives::UNKNOWN_TITLE;
use citerank_core::{CitationRecord, CiteRankError, PaperId};
use serde_json::Value;
use std::io::BufRead;

/// Parse the citation stream.
///
/// Lines that are not objects, lack a string `citedPaperId`, or lack an
/// object `citingPaper` are skipped. Inside `citingPaper`, a non-string
/// `paperId` becomes `"unknown"`, a non-string title is left unset and a
/// non-integer year is treated as unknown.
pub fn parse_citations<R: BufRead>(reader: R) -> Result<Parsed<CitationRecord>, CiteRankError> {
    let mut parsed = Parsed::default();
    let mut log = SkipLog::new("citations");

    for (number, line) in read_lines(reader).enumerate() {
        let line = line?;
        match parse_line(&line) {
            Ok(record) => parsed.accept(record),
            Err(reason) => {
                log.warn(number + 1, reason);
                parsed.skip();
            }
        }

        if (number + 1) % PROGRESS_INTERVAL == 0 {
            tracing::info!(lines = number + 1, "Processed citation lines");
        }
    }

    tracing::debug!(
        processed = parsed.report.processed,
        skipped = parsed.report.skipped,
        "Citations parsed"
    );
    Ok(parsed)
}

fn parse_line(line: &str) -> Result<CitationRecord, &'static str> {
    let value: Value = serde_json::from_str(line).map_err(|_| "not valid JSON")?;
    let object = value.as_object().ok_or("not a JSON object")?;

    let cited = object
        .get("citedPaperId")
        .and_then(Value::as_str)
        .ok_or("citedPaperId missing or not a string")?;
    let citing = object
        .get("citingPaper")
        .and_then(Value::as_object)
        .ok_or("citingPaper missing or not an object")?;

    let citing_id = citing
        .get("paperId")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_TITLE);
    let title = citing
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string);
    let year = citing
        .get("year")
        .and_then(Value::as_i64)
        .and_then(|year| i32::try_from(year).ok());

    Ok(CitationRecord::new(PaperId::new(cited), PaperId::new(citing_id)).with_citing_details(title, year))
}
