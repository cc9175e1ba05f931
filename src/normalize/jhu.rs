// src/normalize/jhu.rs
// JHU CSSE daily reports (one `MM-DD-YYYY.csv` per day).

use std::path::Path;

use chrono::NaiveDate;

use super::{Normalized, SchemaVersion, measure_cell, text_cell};
use crate::csv::{RawTable, read_table};
use crate::error::{Error, Issue, Result};
use crate::record::{CanonicalRecord, Field, Totals};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Province,
    Country,
    Region,
    Measure(Field),
}

const ALIASES: &[(&str, Slot)] = &[
    ("Province/State", Slot::Province),
    ("Province_State", Slot::Province),
    ("Country/Region", Slot::Country),
    ("Country_Region", Slot::Country),
    ("Admin2", Slot::Region),
    ("Confirmed", Slot::Measure(Field::Confirmed)),
    ("Deaths", Slot::Measure(Field::Deaths)),
    ("Recovered", Slot::Measure(Field::Recovered)),
    ("Active", Slot::Measure(Field::Active)),
];

/// Known columns with no canonical counterpart.
const DROPPED: &[&str] = &[
    "Last Update",
    "Last_Update",
    "Latitude",
    "Longitude",
    "Lat",
    "Long_",
    "FIPS",
    "Combined_Key",
    "Incident_Rate",
    "Incidence_Rate",
    "Case-Fatality_Ratio",
    "Case_Fatality_Ratio",
];

#[derive(Default)]
struct Columns {
    province: Option<usize>,
    country: Option<usize>,
    region: Option<usize>,
    measures: [Option<usize>; 4],
}

impl Columns {
    fn resolve(headers: &[String], version: SchemaVersion, origin: &str) -> Self {
        let mut cols = Columns::default();
        for (i, h) in headers.iter().enumerate() {
            let Some((_, slot)) = ALIASES.iter().find(|(name, _)| name == h) else {
                if !DROPPED.contains(&h.as_str()) {
                    logd!("{origin}: ignoring unknown column `{h}`");
                }
                continue;
            };
            match *slot {
                Slot::Province => cols.province = Some(i),
                Slot::Country => cols.country = Some(i),
                Slot::Region if version.carries_region() => cols.region = Some(i),
                Slot::Region => {}
                Slot::Measure(f) if version.carries(f) => cols.measures[f as usize] = Some(i),
                Slot::Measure(_) => {}
            }
        }
        cols
    }
}

/// Map one daily report onto canonical records.
pub fn normalize(table: &RawTable, date: NaiveDate, version: SchemaVersion, origin: &str) -> Normalized {
    let cols = Columns::resolve(&table.headers, version, origin);
    let mut out = Normalized::default();

    for (i, row) in table.rows.iter().enumerate() {
        let Some(country) = text_cell(row, cols.country) else {
            out.issues.push(Issue::SchemaMismatch {
                origin: origin.to_string(),
                row: i + 1,
                field: "country",
            });
            continue;
        };

        let mut flagged = false;
        let mut totals = Totals::default();
        for field in Field::ALL {
            // Column expected by the layout but absent from the file stays None.
            let value = cols.measures[field as usize].map(|c| {
                let raw = row.get(c).map(String::as_str).unwrap_or("");
                let context = format!("{origin} row {}", i + 1);
                measure_cell(raw, field, &context, &mut flagged, &mut out.issues)
            });
            totals.set(field, value);
        }

        out.records.push(CanonicalRecord {
            date,
            region: text_cell(row, cols.region),
            province: text_cell(row, cols.province),
            country,
            totals,
            flagged,
        });
    }
    out
}

/// Date a daily report covers, from its `MM-DD-YYYY` file stem.
pub fn report_date(path: &Path) -> Result<NaiveDate> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Invalid(format!("no file name in {}", path.display())))?;
    NaiveDate::parse_from_str(stem, "%m-%d-%Y").map_err(|source| Error::Date { raw: stem.to_string(), source })
}

/// Read, date and normalize one report file.
pub fn read_report(path: &Path) -> Result<Normalized> {
    let date = report_date(path)?;
    let table = read_table(path)?;
    let origin = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(normalize(&table, date, SchemaVersion::for_date(date), &origin))
}
