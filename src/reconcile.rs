// src/reconcile.rs
//! Temporal Reconciler: one record per entity per day, gaps forward-filled.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::pipeline::pool;
use crate::record::{CanonicalRecord, DateWindow, EntityKey, Field, Totals, sort_by_date_key};

/// Reconcile one entity's records over `window`.
///
/// Observed days pass through unchanged; missing days repeat the last
/// observed totals with `flagged` off. The last observation before the
/// window seeds the carry. Before the entity's first observation each
/// measure that observation reports is zero and the rest stay unreported.
/// When a day appears twice the later record in input order wins. Records
/// outside the window are dropped.
pub fn reconcile(series: &[CanonicalRecord], window: &DateWindow) -> Vec<CanonicalRecord> {
    let Some(first) = series.first() else {
        return Vec::new();
    };
    let key = first.key();

    let mut by_day: BTreeMap<NaiveDate, &CanonicalRecord> = BTreeMap::new();
    let mut before: Option<&CanonicalRecord> = None;
    for rec in series {
        if rec.date < window.first {
            if before.is_none_or(|b| rec.date >= b.date) {
                before = Some(rec);
            }
        } else if window.contains(rec.date) && by_day.insert(rec.date, rec).is_some() {
            logd!("{key}: duplicate record for {}, keeping the later one", rec.date);
        }
    }

    let mut carry = match before {
        Some(rec) => rec.totals,
        None => initial_carry(series),
    };
    let mut out = Vec::with_capacity(window.num_days());
    for day in window.days() {
        match by_day.get(&day) {
            Some(rec) => {
                carry = rec.totals;
                out.push((*rec).clone());
            }
            None => out.push(CanonicalRecord::new(day, &key, carry)),
        }
    }
    out
}

/// Zero for each measure the earliest observation reports, unreported otherwise.
fn initial_carry(series: &[CanonicalRecord]) -> Totals {
    let mut carry = Totals::default();
    if let Some(earliest) = series.iter().min_by_key(|r| r.date) {
        for field in Field::ALL {
            if earliest.get(field).is_some() {
                carry.set(field, Some(0));
            }
        }
    }
    carry
}

/// Group `records` by entity and reconcile every entity over `window` on
/// `workers` threads. Output is sorted by (date, entity key).
pub fn reconcile_all(records: &[CanonicalRecord], window: &DateWindow, workers: usize) -> Vec<CanonicalRecord> {
    let groups: Vec<Vec<CanonicalRecord>> = group_by_key(records).into_values().collect();
    let mut out: Vec<CanonicalRecord> = pool::map_indexed(&groups, workers, |_, g| reconcile(g, window))
        .into_iter()
        .flatten()
        .collect();
    sort_by_date_key(&mut out);
    logd!("reconciled {} entities into {} records", groups.len(), out.len());
    out
}

/// Records per entity, input order kept within each entity.
pub fn group_by_key(records: &[CanonicalRecord]) -> BTreeMap<EntityKey, Vec<CanonicalRecord>> {
    let mut groups: BTreeMap<EntityKey, Vec<CanonicalRecord>> = BTreeMap::new();
    for r in records {
        groups.entry(r.key()).or_default().push(r.clone());
    }
    groups
}
