// src/store.rs
//! Persistence sink: canonical records and derived series as CSV/TSV with a
//! fixed column order.

use std::{fs::File, io, path::Path};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::csv::{create, delim_for};
use crate::error::Result;
use crate::metrics::DailyDelta;
use crate::record::{CanonicalRecord, Totals};

pub const RECORD_HEADERS: [&str; 9] = [
    "Date",
    "Region",
    "Province",
    "Country",
    "Total_Confirmed",
    "Total_Deaths",
    "Total_Recovered",
    "Total_Active",
    "Flagged",
];

pub const DELTA_HEADERS: [&str; 8] = [
    "Date",
    "Region",
    "Province",
    "Country",
    "Daily_Confirmed",
    "Daily_Deaths",
    "Daily_Recovered",
    "Daily_Active",
];

/// One persisted row. Columns other than the identity may be absent from
/// older files and default to "not reported".
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Region", default)]
    region: Option<String>,
    #[serde(rename = "Province", default)]
    province: Option<String>,
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Total_Confirmed", default)]
    confirmed: Option<u64>,
    #[serde(rename = "Total_Deaths", default)]
    deaths: Option<u64>,
    #[serde(rename = "Total_Recovered", default)]
    recovered: Option<u64>,
    #[serde(rename = "Total_Active", default)]
    active: Option<u64>,
    #[serde(rename = "Flagged", default)]
    flagged: bool,
}

impl From<&CanonicalRecord> for StoredRecord {
    fn from(r: &CanonicalRecord) -> Self {
        Self {
            date: r.date,
            region: r.region.clone(),
            province: r.province.clone(),
            country: r.country.clone(),
            confirmed: r.totals.confirmed,
            deaths: r.totals.deaths,
            recovered: r.totals.recovered,
            active: r.totals.active,
            flagged: r.flagged,
        }
    }
}

impl From<StoredRecord> for CanonicalRecord {
    fn from(s: StoredRecord) -> Self {
        CanonicalRecord {
            date: s.date,
            region: s.region.filter(|v| !v.is_empty()),
            province: s.province.filter(|v| !v.is_empty()),
            country: s.country,
            totals: Totals {
                confirmed: s.confirmed,
                deaths: s.deaths,
                recovered: s.recovered,
                active: s.active,
            },
            flagged: s.flagged,
        }
    }
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// Canonical columns of one record, in [`RECORD_HEADERS`] order.
pub fn record_cells(r: &CanonicalRecord) -> Vec<String> {
    vec![
        r.date.format("%Y-%m-%d").to_string(),
        r.region.clone().unwrap_or_default(),
        r.province.clone().unwrap_or_default(),
        r.country.clone(),
        opt(r.totals.confirmed),
        opt(r.totals.deaths),
        opt(r.totals.recovered),
        opt(r.totals.active),
        r.flagged.to_string(),
    ]
}

fn headers_with(extra: &str) -> Vec<String> {
    RECORD_HEADERS.iter().map(|h| h.to_string()).chain([extra.to_string()]).collect()
}

/// Write records; the delimiter follows the file extension.
pub fn save_records(path: &Path, records: &[CanonicalRecord]) -> Result<()> {
    let mut w = create(path, delim_for(path))?;
    for r in records {
        w.serialize(StoredRecord::from(r))?;
    }
    if records.is_empty() {
        w.write_record(RECORD_HEADERS)?;
    }
    w.flush()?;
    logd!("saved {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn load_records(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let file = File::open(path)?;
    read_records(io::BufReader::new(file), delim_for(path))
}

pub fn read_records<R: io::Read>(input: R, delim: u8) -> Result<Vec<CanonicalRecord>> {
    let mut rdr = ::csv::ReaderBuilder::new().delimiter(delim).from_reader(input);
    let mut out = Vec::new();
    for row in rdr.deserialize::<StoredRecord>() {
        out.push(row?.into());
    }
    Ok(out)
}

pub fn save_deltas(path: &Path, deltas: &[DailyDelta]) -> Result<()> {
    let mut w = create(path, delim_for(path))?;
    w.write_record(DELTA_HEADERS)?;
    for d in deltas {
        w.write_record([
            d.date.format("%Y-%m-%d").to_string(),
            d.key.region.clone().unwrap_or_default(),
            d.key.province.clone().unwrap_or_default(),
            d.key.country.clone(),
            opt(d.confirmed),
            opt(d.deaths),
            opt(d.recovered),
            opt(d.active),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Records plus a `Day` column (days since the entity's anchor; blank when
/// the entity never reached it).
pub fn save_aligned(path: &Path, rows: &[(CanonicalRecord, Option<i64>)]) -> Result<()> {
    let mut w = create(path, delim_for(path))?;
    w.write_record(headers_with("Day"))?;
    for (r, day) in rows {
        let mut cells = record_cells(r);
        cells.push(opt(*day));
        w.write_record(cells)?;
    }
    w.flush()?;
    Ok(())
}

/// Records plus a `Population` column.
pub fn save_with_population(path: &Path, rows: &[(CanonicalRecord, u64)]) -> Result<()> {
    let mut w = create(path, delim_for(path))?;
    w.write_record(headers_with("Population"))?;
    for (r, pop) in rows {
        let mut cells = record_cells(r);
        cells.push(pop.to_string());
        w.write_record(cells)?;
    }
    w.flush()?;
    Ok(())
}
