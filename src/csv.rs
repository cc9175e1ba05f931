// src/csv.rs
use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

use crate::error::Result;
use crate::file::ensure_parent;

/// One delimited file as read: header row plus string cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Position of the first header equal to any of `names`.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        self.headers.iter().position(|h| names.iter().any(|n| h == n))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/* ---------------- Parsing ---------------- */

/// Parse delimited text. Ragged rows are kept as-is (the JHU archive has a few).
pub fn parse_table<R: Read>(input: R, delim: u8) -> Result<RawTable> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .delimiter(delim)
        .flexible(true)
        .trim(::csv::Trim::None)
        .from_reader(input);

    let headers = rdr
        .headers()?
        .iter()
        .map(crate::core::sanitize::normalize_header)
        .collect();

    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        if rec.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(rec.iter().map(str::to_string).collect());
    }
    Ok(RawTable { headers, rows })
}

/// Read a CSV/TSV file; the delimiter follows the extension.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path)?;
    parse_table(io::BufReader::new(file), delim_for(path))
}

/// `\t` for `.tsv`, `,` otherwise.
pub fn delim_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/* ---------------- Writing ---------------- */

/// Writer over any sink with the given delimiter.
pub fn writer<W: Write>(w: W, delim: u8) -> ::csv::Writer<W> {
    ::csv::WriterBuilder::new().delimiter(delim).from_writer(w)
}

/// Create (truncate) `path` and return a writer on it, creating parent dirs.
pub fn create(path: &Path, delim: u8) -> Result<::csv::Writer<File>> {
    ensure_parent(path)?;
    Ok(writer(File::create(path)?, delim))
}

/// Write a header plus rows to `path` in one go.
pub fn write_table(path: &Path, headers: &[String], rows: &[Vec<String>], delim: u8) -> Result<()> {
    let mut w = create(path, delim)?;
    w.write_record(headers)?;
    for r in rows {
        w.write_record(r)?;
    }
    w.flush()?;
    Ok(())
}

/// Stringify rows with a header (stdout output for the CLI).
pub fn rows_to_string(headers: &[String], rows: &[Vec<String>], delim: u8) -> Result<String> {
    let mut w = writer(Vec::new(), delim);
    w.write_record(headers)?;
    for r in rows {
        w.write_record(r)?;
    }
    let buf = w.into_inner().map_err(|e| e.into_error())?;
    Ok(match String::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(&e.into_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_and_ragged_rows() {
        let text = "\u{feff}Province/State,Country/Region,Confirmed\n\"Washington, D.C.\",US,3\n,China\n\n";
        let t = parse_table(text.as_bytes(), b',').unwrap();
        assert_eq!(t.headers[0], "Province/State");
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0][0], "Washington, D.C.");
        assert_eq!(t.rows[1].len(), 2);
        assert_eq!(t.column(&["Confirmed"]), Some(2));
    }

    #[test]
    fn tsv_round_trip_through_string() {
        let out = rows_to_string(&strings!["a", "b"], &[strings!["1", "x\ty"]], b'\t').unwrap();
        assert_eq!(out, "a\tb\n1\t\"x\ty\"\n");
    }
}
