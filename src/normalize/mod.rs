// src/normalize/mod.rs
//! Schema Normalizer: maps one raw per-day table onto [`CanonicalRecord`]s.
//!
//! Two layouts are understood:
//! - [`jhu`]: the JHU CSSE daily reports, whose columns changed on
//!   2020-03-22 (see [`SchemaVersion`]);
//! - [`ecdc`]: the ECDC geographic distribution export (daily counts per
//!   country, cumulated here).
//!
//! Rows are never fatal: a row missing its identity is dropped with an
//! [`Issue::SchemaMismatch`] and the rest of the table is processed.

pub mod ecdc;
pub mod jhu;

use chrono::NaiveDate;

use crate::config::consts::{JHU_COUNTY_LAYOUT_FROM, ymd};
use crate::error::Issue;
use crate::record::{CanonicalRecord, Field};

/// Column layout of a JHU daily report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaVersion {
    /// `Province/State, Country/Region, Last Update, Confirmed, Deaths,
    /// Recovered[, Latitude, Longitude]`. No region, no active.
    Legacy,
    /// `FIPS, Admin2, Province_State, Country_Region, Last_Update, Lat,
    /// Long_, Confirmed, Deaths, Recovered, Active, Combined_Key`.
    County,
}

impl SchemaVersion {
    pub fn for_date(date: NaiveDate) -> Self {
        if date < ymd(JHU_COUNTY_LAYOUT_FROM) {
            SchemaVersion::Legacy
        } else {
            SchemaVersion::County
        }
    }

    pub fn carries(&self, field: Field) -> bool {
        match self {
            SchemaVersion::Legacy => field != Field::Active,
            SchemaVersion::County => true,
        }
    }

    pub fn carries_region(&self) -> bool {
        matches!(self, SchemaVersion::County)
    }
}

/// Normalizer output: records plus everything that went wrong on the way.
#[derive(Clone, Debug, Default)]
pub struct Normalized {
    pub records: Vec<CanonicalRecord>,
    pub issues: Vec<Issue>,
}

/// Parse one measure cell. Blank means zero; garbage means zero plus a flag.
pub(crate) fn measure_cell(
    raw: &str,
    field: Field,
    context: &str,
    flagged: &mut bool,
    issues: &mut Vec<Issue>,
) -> u64 {
    if raw.trim().is_empty() {
        return 0;
    }
    match crate::core::sanitize::parse_count(raw) {
        Some(v) => v,
        None => {
            *flagged = true;
            issues.push(Issue::ParseFailure {
                context: context.to_string(),
                field,
                raw: raw.to_string(),
            });
            0
        }
    }
}

/// Trimmed, non-empty cell at `col`.
pub(crate) fn text_cell(row: &[String], col: Option<usize>) -> Option<String> {
    col.and_then(|c| row.get(c))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_boundary() {
        assert_eq!(SchemaVersion::for_date(ymd((2020, 3, 21))), SchemaVersion::Legacy);
        assert_eq!(SchemaVersion::for_date(ymd((2020, 3, 22))), SchemaVersion::County);
        assert!(!SchemaVersion::Legacy.carries(Field::Active));
        assert!(!SchemaVersion::Legacy.carries_region());
    }

    #[test]
    fn measure_cells() {
        let mut flagged = false;
        let mut issues = Vec::new();
        assert_eq!(measure_cell("", Field::Deaths, "t", &mut flagged, &mut issues), 0);
        assert!(!flagged);
        assert_eq!(measure_cell("12.0", Field::Deaths, "t", &mut flagged, &mut issues), 12);
        assert_eq!(measure_cell("n/a", Field::Deaths, "t", &mut flagged, &mut issues), 0);
        assert!(flagged);
        assert_eq!(issues.len(), 1);
    }
}
