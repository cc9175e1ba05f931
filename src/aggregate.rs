// src/aggregate.rs
//! Aggregator: sums sub-entity records up to a parent granularity.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::record::{CanonicalRecord, EntityKey, Field, Granularity, Totals};

/// Non-geographic buckets that never belong to an in-state breakdown.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "Chicago",
    "Unassigned Location (From Diamond Princess)",
    "Grand Princess Cruise Ship",
    "Grand Princess",
    "Diamond Princess",
    "Wuhan Evacuee",
    "Recovered",
    "Northern Mariana Islands",
    "American Samoa",
    "Guam",
    "United States Virgin Islands",
    "Virgin Islands",
    "US",
    "Unassigned",
];

pub const US: &str = "US";

#[derive(Clone, Debug)]
pub struct Aggregator {
    exclusions: Vec<String>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect())
    }
}

fn add(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
    }
}

impl Aggregator {
    pub fn new(exclusions: Vec<String>) -> Self {
        Self { exclusions }
    }

    /// Province or region name is on the exclusion list.
    pub fn is_excluded(&self, rec: &CanonicalRecord) -> bool {
        [rec.province.as_deref(), rec.region.as_deref()]
            .into_iter()
            .flatten()
            .any(|name| self.exclusions.iter().any(|e| e == name))
    }

    /// One record per (date, parent key) with each measure summed.
    /// A measure stays `None` only if every contributor lacks it.
    pub fn aggregate(&self, records: &[CanonicalRecord], level: Granularity) -> Vec<CanonicalRecord> {
        let mut sums: BTreeMap<(NaiveDate, EntityKey), (Totals, bool)> = BTreeMap::new();
        let mut excluded = 0usize;

        for rec in records {
            if self.is_excluded(rec) {
                excluded += 1;
                continue;
            }
            let slot = sums
                .entry((rec.date, rec.key().truncate(level)))
                .or_insert((Totals::default(), false));
            for field in Field::ALL {
                slot.0.set(field, add(slot.0.get(field), rec.get(field)));
            }
            slot.1 |= rec.flagged;
        }

        if excluded > 0 {
            logd!("aggregate: {excluded} excluded records");
        }

        sums.into_iter()
            .map(|((date, key), (totals, flagged))| {
                let mut r = CanonicalRecord::new(date, &key, totals);
                r.flagged = flagged;
                r
            })
            .collect()
    }

    /// US states only: other countries and compound localities
    /// (`King County, WA`) are dropped, then counties are summed per state.
    pub fn us_state_view(&self, records: &[CanonicalRecord]) -> Vec<CanonicalRecord> {
        let us: Vec<CanonicalRecord> = records
            .iter()
            .filter(|r| r.country == US)
            .filter(|r| r.province.as_deref().is_some_and(|p| !p.contains(',')))
            .cloned()
            .collect();
        self.aggregate(&us, Granularity::Province)
    }
}
