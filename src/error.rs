// src/error.rs
//
// Two kinds of failure live here:
// - `Issue`: localized, non-fatal outcomes (one row, one document, one
//   entity). Components hand these back next to their output and carry on.
// - `Error`: boundary failures (I/O, CSV, HTTP, config). Only these travel
//   through `?`.

use std::io;

use chrono::NaiveDate;

use crate::record::Field;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Issue {
    /// Required identifying field absent; the row was dropped.
    #[error("{origin}: row {row} has no `{field}`, dropped")]
    SchemaMismatch {
        origin: String,
        row: usize,
        field: &'static str,
    },

    /// No candidate table reached the acceptance score; zero records.
    #[error("{document}: no data table found")]
    ExtractionMiss { document: String },

    /// Numeric cell coerced to zero; the record is flagged.
    #[error("{context}: `{raw}` is not a count for {field}, using 0")]
    ParseFailure {
        context: String,
        field: Field,
        raw: String,
    },

    /// Entity missing from a lookup table; excluded from that output only.
    #[error("{entity} not found in {table}")]
    LookupMiss { entity: String, table: &'static str },
}

impl Issue {
    pub fn kind(&self) -> &'static str {
        match self {
            Issue::SchemaMismatch { .. } => "schema-mismatch",
            Issue::ExtractionMiss { .. } => "extraction-miss",
            Issue::ParseFailure { .. } => "parse-failure",
            Issue::LookupMiss { .. } => "lookup-miss",
        }
    }
}

/// Log every issue at warn level (extraction misses at debug: they are the
/// normal outcome for early page revisions).
pub fn log_issues(issues: &[Issue]) {
    for issue in issues {
        match issue {
            Issue::ExtractionMiss { .. } => logd!("{issue}"),
            _ => logw!("{issue}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("bad date `{raw}`: {source}")]
    Date {
        raw: String,
        source: chrono::ParseError,
    },

    #[error("empty date window ({first} after {last})")]
    EmptyWindow { first: NaiveDate, last: NaiveDate },

    #[error("{0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, Error>;
