// src/normalize/ecdc.rs
// ECDC geographic distribution export: one row per country per day, daily counts.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;

use super::{Normalized, text_cell};
use crate::core::sanitize::{parse_count, parse_signed};
use crate::csv::{RawTable, read_table};
use crate::error::{Issue, Result};
use crate::record::{CanonicalRecord, EntityKey, Field, Totals, sort_by_date_key};
use crate::reference::PopulationTable;

const DATE: &[&str] = &["dateRep", "DateRep"];
const CASES: &[&str] = &["cases", "Cases"];
const DEATHS: &[&str] = &["deaths", "Deaths"];
const COUNTRY: &[&str] = &["countriesAndTerritories", "Countries and territories"];
const POPULATION: &[&str] = &["popData2018", "popData2019", "Pop_Data.2018"];

/// Normalized ECDC feed: cumulative records plus the population column.
#[derive(Clone, Debug, Default)]
pub struct EcdcData {
    pub records: Vec<CanonicalRecord>,
    pub population: PopulationTable,
    pub issues: Vec<Issue>,
}

struct Daily {
    date: NaiveDate,
    cases: i64,
    deaths: Option<i64>,
    flagged: bool,
}

/// `dd/mm/yyyy`, ISO accepted too.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn daily_cell(raw: &str, field: Field, context: &str, flagged: &mut bool, issues: &mut Vec<Issue>) -> i64 {
    if raw.trim().is_empty() {
        return 0;
    }
    parse_signed(raw).unwrap_or_else(|| {
        *flagged = true;
        issues.push(Issue::ParseFailure { context: context.to_string(), field, raw: raw.to_string() });
        0
    })
}

/// Cumulate the daily feed per country (clamped at zero) and collect population.
pub fn normalize(table: &RawTable, origin: &str) -> EcdcData {
    let date_col = table.column(DATE);
    let cases_col = table.column(CASES);
    let deaths_col = table.column(DEATHS);
    let country_col = table.column(COUNTRY);
    let pop_col = table.column(POPULATION);

    let mut out = EcdcData::default();
    let mut by_country: BTreeMap<String, Vec<Daily>> = BTreeMap::new();

    for (i, row) in table.rows.iter().enumerate() {
        let Some(country) = text_cell(row, country_col) else {
            out.issues.push(Issue::SchemaMismatch { origin: origin.to_string(), row: i + 1, field: "country" });
            continue;
        };
        let Some(date) = text_cell(row, date_col).and_then(|d| parse_date(&d)) else {
            out.issues.push(Issue::SchemaMismatch { origin: origin.to_string(), row: i + 1, field: "date" });
            continue;
        };

        let context = format!("{origin} row {}", i + 1);
        let cell = |c: Option<usize>| c.and_then(|c| row.get(c)).map(String::as_str);
        let mut flagged = false;
        let cases = daily_cell(cell(cases_col).unwrap_or(""), Field::Confirmed, &context, &mut flagged, &mut out.issues);
        let deaths = cell(deaths_col).map(|raw| daily_cell(raw, Field::Deaths, &context, &mut flagged, &mut out.issues));

        if let Some(pop) = cell(pop_col).and_then(parse_count) {
            let key = EntityKey::country(country.clone());
            if out.population.get(&key).is_none() {
                out.population.insert(key, pop);
            }
        }

        by_country.entry(country).or_default().push(Daily { date, cases, deaths, flagged });
    }

    for (country, mut days) in by_country {
        // the export is newest-first; stable sort keeps same-day rows in input order
        days.sort_by_key(|d| d.date);
        let key = EntityKey::country(country);
        let (mut cases, mut deaths) = (0i64, 0i64);
        for d in days {
            cases = (cases + d.cases).max(0);
            let totals = Totals {
                confirmed: Some(cases as u64),
                deaths: d.deaths.map(|v| {
                    deaths = (deaths + v).max(0);
                    deaths as u64
                }),
                recovered: None,
                active: None,
            };
            let mut rec = CanonicalRecord::new(d.date, &key, totals);
            rec.flagged = d.flagged;
            out.records.push(rec);
        }
    }

    sort_by_date_key(&mut out.records);
    out
}

pub fn read_export(path: &Path) -> Result<EcdcData> {
    let table = read_table(path)?;
    let origin = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let data = normalize(&table, &origin);
    logf!(
        "ECDC: {} records, {} countries with population, {} issues",
        data.records.len(),
        data.population.len(),
        data.issues.len()
    );
    Ok(data)
}

impl From<EcdcData> for Normalized {
    fn from(d: EcdcData) -> Self {
        Normalized { records: d.records, issues: d.issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates() {
        assert_eq!(parse_date("31/12/2019"), NaiveDate::from_ymd_opt(2019, 12, 31));
        assert_eq!(parse_date("2020-03-01"), NaiveDate::from_ymd_opt(2020, 3, 1));
        assert_eq!(parse_date("March 1"), None);
    }
}
