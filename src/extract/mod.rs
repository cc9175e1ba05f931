// src/extract/mod.rs
//! Table Extractor: finds the per-sub-region case table in one HTML page.
//!
//! A candidate table (class in [`TableVocabulary::classes`]) earns one point
//! per header cell whose text exactly equals a slot synonym, and one point
//! when a row's region cell contains a known sub-region name. Only a table
//! scoring exactly 5 with all four slots resolved is accepted, and the first
//! one in document order wins.

pub mod revisions;
pub mod table;

use chrono::NaiveDate;

use crate::core::sanitize::{parse_count, strip_annotations};
use crate::error::Issue;
use crate::record::{CanonicalRecord, EntityKey, Field, Totals};
use crate::reference::ReferenceSet;
use table::{HtmlRow, HtmlTable};

/// Score a table must reach: four header slots plus the region match.
pub const ACCEPT_SCORE: u32 = 5;

/// Header synonyms and table classes that mark a data table.
#[derive(Clone, Debug)]
pub struct TableVocabulary {
    pub classes: Vec<String>,
    pub region: Vec<String>,
    pub confirmed: Vec<String>,
    pub deaths: Vec<String>,
    pub recovered: Vec<String>,
}

impl Default for TableVocabulary {
    fn default() -> Self {
        Self {
            classes: strings![
                "wikitable sortable",
                "wikitable sortable collapsible",
                "wikitable plainrowheaders sortable",
            ],
            region: strings!["County", "county", "Parish", "parish", "Region", "region"],
            confirmed: strings![
                "Cases", "cases", "Confirmed Cases", "confirmed cases", "Confirmed_Cases",
                "confirmed_cases", "Confirmed cases", "Total Cases", "Positive Cases",
                "Confirmed Cases*", "Total Confirmed Cases", "ConfirmedCases",
            ],
            deaths: strings!["Deaths", "deaths"],
            recovered: strings!["Recovered", "recovered", "Recoveries", "recoveries", "Recov."],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Region,
    Measure(Field),
}

impl TableVocabulary {
    fn slot_of(&self, header: &str) -> Option<Slot> {
        let hit = |set: &[String]| set.iter().any(|s| s == header);
        if hit(&self.region) {
            Some(Slot::Region)
        } else if hit(&self.confirmed) {
            Some(Slot::Measure(Field::Confirmed))
        } else if hit(&self.deaths) {
            Some(Slot::Measure(Field::Deaths))
        } else if hit(&self.recovered) {
            Some(Slot::Measure(Field::Recovered))
        } else {
            None
        }
    }

    fn is_candidate(&self, t: &HtmlTable) -> bool {
        self.classes.iter().any(|c| *c == t.class)
    }
}

/// Resolved column positions (colspan-aware).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotColumns {
    pub region: Option<usize>,
    pub confirmed: Option<usize>,
    pub deaths: Option<usize>,
    pub recovered: Option<usize>,
}

impl SlotColumns {
    fn set(&mut self, slot: Slot, col: usize) {
        match slot {
            Slot::Region => self.region = Some(col),
            Slot::Measure(Field::Confirmed) => self.confirmed = Some(col),
            Slot::Measure(Field::Deaths) => self.deaths = Some(col),
            Slot::Measure(Field::Recovered) => self.recovered = Some(col),
            Slot::Measure(Field::Active) => {}
        }
    }

    pub fn complete(&self) -> bool {
        self.region.is_some() && self.confirmed.is_some() && self.deaths.is_some() && self.recovered.is_some()
    }

    pub fn measure(&self, field: Field) -> Option<usize> {
        match field {
            Field::Confirmed => self.confirmed,
            Field::Deaths => self.deaths,
            Field::Recovered => self.recovered,
            Field::Active => None,
        }
    }
}

/// How (and whether) a table was matched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableMatchMetadata {
    pub found: bool,
    pub table_index: usize,
    pub columns: SlotColumns,
    pub data_start_row: usize,
    pub data_row_count: usize,
    pub score: u32,
}

/// Province a page reports on and the day it stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractTarget {
    pub country: String,
    pub province: String,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, Default)]
pub struct Extraction {
    pub records: Vec<CanonicalRecord>,
    pub metadata: TableMatchMetadata,
    pub issues: Vec<Issue>,
}

fn region_matches(row: &HtmlRow, col: usize, names: &[&str]) -> bool {
    row.cell_at(col)
        .is_some_and(|c| names.iter().any(|n| c.text.contains(n)))
}

/// Score one candidate table.
pub fn score_table(t: &HtmlTable, names: &[&str], vocab: &TableVocabulary) -> TableMatchMetadata {
    let mut meta = TableMatchMetadata { table_index: t.index, ..Default::default() };

    for row in &t.rows {
        for (pos, cell) in row.positioned().filter(|(_, c)| c.header) {
            if let Some(slot) = vocab.slot_of(&cell.text) {
                meta.columns.set(slot, pos);
                meta.score += 1;
            }
        }
    }

    // Row 0 is the header; some states share a name with one of their counties.
    if let Some(col) = meta.columns.region {
        let mut last = None;
        for (i, row) in t.rows.iter().enumerate().skip(1) {
            if region_matches(row, col, names) {
                if last.is_none() {
                    meta.data_start_row = i;
                    meta.score += 1;
                }
                last = Some(i);
            }
        }
        if let Some(last) = last {
            meta.data_row_count = last - meta.data_start_row + 1;
        }
    }

    meta.found = meta.score == ACCEPT_SCORE && meta.columns.complete();
    meta
}

/// Locate the accepted table among `tables`, if any.
pub fn locate(tables: &[HtmlTable], names: &[&str], vocab: &TableVocabulary) -> Option<TableMatchMetadata> {
    tables
        .iter()
        .filter(|t| vocab.is_candidate(t))
        .map(|t| {
            let meta = score_table(t, names, vocab);
            logd!("table #{} class=`{}` score {}", t.index, t.class, meta.score);
            meta
        })
        .find(|m| m.found)
}

/// Extract records for `target` from one HTML document.
pub fn extract_with(
    doc: &str,
    document: &str,
    target: &ExtractTarget,
    names: &[&str],
    vocab: &TableVocabulary,
) -> Extraction {
    let mut out = Extraction::default();
    let tables = table::tables(doc);

    let Some(meta) = locate(&tables, names, vocab) else {
        out.issues.push(Issue::ExtractionMiss { document: document.to_string() });
        return out;
    };
    let Some(t) = tables.get(meta.table_index) else {
        out.issues.push(Issue::ExtractionMiss { document: document.to_string() });
        return out;
    };
    let cols = meta.columns;
    let region_col = cols.region.unwrap_or_default();

    let end = meta.data_start_row + meta.data_row_count;
    for (i, row) in t.rows.iter().enumerate().take(end).skip(meta.data_start_row) {
        // totals and footnote rows inside the range
        if !region_matches(row, region_col, names) {
            continue;
        }
        let region = row.cell_at(region_col).map(|c| strip_annotations(&c.text)).unwrap_or_default();
        let key = EntityKey::region(target.country.clone(), target.province.clone(), region);

        let mut flagged = false;
        let mut totals = Totals { active: None, ..Totals::ZERO };
        for field in [Field::Confirmed, Field::Deaths, Field::Recovered] {
            let raw = cols
                .measure(field)
                .and_then(|c| row.cell_at(c))
                .map(|c| c.text.as_str())
                .unwrap_or("");
            let value = parse_count(raw).unwrap_or_else(|| {
                flagged = true;
                out.issues.push(Issue::ParseFailure {
                    context: format!("{document} row {i}"),
                    field,
                    raw: raw.to_string(),
                });
                0
            });
            totals.set(field, Some(value));
        }

        let mut rec = CanonicalRecord::new(target.date, &key, totals);
        rec.flagged = flagged;
        out.records.push(rec);
    }

    logd!(
        "{document}: table #{} rows {}..{} -> {} records",
        meta.table_index,
        meta.data_start_row,
        end,
        out.records.len()
    );
    out.metadata = meta;
    out
}

/// Extract with the default vocabulary and the reference names of `target`.
pub fn extract(doc: &str, document: &str, target: &ExtractTarget, reference: &ReferenceSet) -> Extraction {
    let names = reference.names_for(&target.country, &target.province);
    if names.is_empty() {
        return Extraction {
            issues: vec![Issue::LookupMiss { entity: target.province.clone(), table: "reference" }],
            ..Default::default()
        };
    }
    extract_with(doc, document, target, &names, &TableVocabulary::default())
}
