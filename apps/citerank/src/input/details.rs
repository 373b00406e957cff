//! Paper details CSV.
//!
//! One header line, then rows of two leading row numbers followed by
//! `arxiv_id, citationCount, year, semantic_id, url, title, published_date,
//! abstract, tldr`.

use super::{Parsed, SkipLog, read_lines, split_csv_line, strip_quotes};
use citerank_core::{CiteRankError, PaperDetails};
use std::io::BufRead;

const MIN_FIELDS: usize = 11;

/// Parse the details CSV. Short rows and rows whose citation count or year
/// fail to convert are skipped.
pub fn parse_details<R: BufRead>(reader: R) -> Result<Parsed<PaperDetails>, CiteRankError> {
    let mut parsed = Parsed::default();
    let mut log = SkipLog::new("details");

    for (number, line) in read_lines(reader).enumerate().skip(1) {
        let line = line?;
        match parse_row(&line) {
            Ok(details) => parsed.accept(details),
            Err(reason) => {
                log.warn(number + 1, &reason);
                parsed.skip();
            }
        }
    }

    tracing::debug!(
        processed = parsed.report.processed,
        skipped = parsed.report.skipped,
        "Paper details parsed"
    );
    Ok(parsed)
}

fn parse_row(line: &str) -> Result<PaperDetails, String> {
    let fields = split_csv_line(line);
    if fields.len() < MIN_FIELDS {
        return Err(format!("expected {} fields, found {}", MIN_FIELDS, fields.len()));
    }

    let citation_count = fields[3]
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("citation count '{}': {}", fields[3], e))?;
    let year = fields[4]
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("year '{}': {}", fields[4], e))?;
    let text = |index: usize| strip_quotes(&fields[index]).to_string();

    Ok(PaperDetails {
        arxiv_id: text(2),
        citation_count,
        year,
        semantic_id: text(5),
        url: text(6),
        title: text(7),
        published_date: text(8),
        abstract_text: text(9),
        tldr: text(10),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = ",idx,arxiv_id,citationCount,year,semantic_id,url,title,published_date,abstract,tldr";

    #[test]
    fn full_row() {
        let input = format!(
            "{HEADER}\n0,0,1706.03762, 9000 ,2017,s1,https://example.org/s1,\"Attention, Revisited\",2017-06-12,We propose.,Short.\n"
        );
        let parsed = parse_details(input.as_bytes()).expect("parse");

        assert_eq!(parsed.report.processed, 1);
        let details = &parsed.records[0];
        assert_eq!(details.arxiv_id, "1706.03762");
        assert_eq!(details.citation_count, 9000);
        assert_eq!(details.year, 2017);
        assert_eq!(details.url, "https://example.org/s1");
        assert_eq!(details.title, "Attention, Revisited");
        assert_eq!(details.published_date, "2017-06-12");
        assert_eq!(details.abstract_text, "We propose.");
        assert_eq!(details.tldr, "Short.");
    }

    #[test]
    fn conversion_failures_are_skipped() {
        let input = format!(
            "{HEADER}\n0,0,a,many,2017,s,u,t,d,x,y\n1,1,a,3,later,s,u,t,d,x,y\n2,2,a,b\n3,3,a,3,2018,s,u,t,d,x,y\n"
        );
        let parsed = parse_details(input.as_bytes()).expect("parse");
        assert_eq!(parsed.report.skipped, 3);
        assert_eq!(parsed.report.processed, 1);
        assert_eq!(parsed.records[0].year, 2018);
    }
}
