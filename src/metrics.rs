// src/metrics.rs
//! Derived-Metrics Engine: daily deltas, threshold alignment, per-capita rates.
//!
//! Every transform is pure and works on one reconciled entity series sorted
//! ascending by date. [`column`] and [`delta_column`] project a field as
//! `(date, value)` points so alignment and rates run on cumulative or daily
//! values alike.

use chrono::NaiveDate;

use crate::config::consts::PER_CAPITA_SCALE;
use crate::error::Issue;
use crate::reconcile::group_by_key;
use crate::record::{CanonicalRecord, EntityKey, Field};
use crate::reference::PopulationTable;

/// `(date, value)`; `None` when the source does not report the field.
pub type Point = (NaiveDate, Option<i64>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyDelta {
    pub date: NaiveDate,
    pub key: EntityKey,
    pub confirmed: Option<i64>,
    pub deaths: Option<i64>,
    pub recovered: Option<i64>,
    pub active: Option<i64>,
}

impl DailyDelta {
    pub fn get(&self, field: Field) -> Option<i64> {
        match field {
            Field::Confirmed => self.confirmed,
            Field::Deaths => self.deaths,
            Field::Recovered => self.recovered,
            Field::Active => self.active,
        }
    }
}

fn diff(cur: Option<u64>, prev: Option<u64>) -> Option<i64> {
    Some(cur? as i64 - prev? as i64)
}

/// `delta[i] = cum[i] - cum[i-1]` for `i >= 1`; day 0 has no baseline and
/// is dropped.
pub fn daily_deltas(series: &[CanonicalRecord]) -> Vec<DailyDelta> {
    series
        .windows(2)
        .map(|w| {
            let (prev, cur) = (&w[0], &w[1]);
            DailyDelta {
                date: cur.date,
                key: cur.key(),
                confirmed: diff(cur.totals.confirmed, prev.totals.confirmed),
                deaths: diff(cur.totals.deaths, prev.totals.deaths),
                recovered: diff(cur.totals.recovered, prev.totals.recovered),
                active: diff(cur.totals.active, prev.totals.active),
            }
        })
        .collect()
}

/// Deltas for a mixed set of entities, sorted by (date, key).
pub fn daily_deltas_all(records: &[CanonicalRecord]) -> Vec<DailyDelta> {
    let mut out: Vec<DailyDelta> = group_by_key(records)
        .into_values()
        .flat_map(|mut series| {
            series.sort_by_key(|r| r.date);
            daily_deltas(&series)
        })
        .collect();
    out.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.key.cmp(&b.key)));
    out
}

pub fn column(series: &[CanonicalRecord], field: Field) -> Vec<Point> {
    series.iter().map(|r| (r.date, r.get(field).map(|v| v as i64))).collect()
}

pub fn delta_column(deltas: &[DailyDelta], field: Field) -> Vec<Point> {
    deltas.iter().map(|d| (d.date, d.get(field))).collect()
}

/// Which day counts as day 0 of an aligned series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignRule {
    /// First day whose value is strictly greater than the threshold.
    Exceeds(u64),
    /// First day with a non-zero value.
    NonZero,
}

impl AlignRule {
    pub fn hit(&self, value: i64) -> bool {
        match *self {
            AlignRule::Exceeds(t) => value > t as i64,
            AlignRule::NonZero => value != 0,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AlignRule::Exceeds(t) => format!("from when cases exceed {t}"),
            AlignRule::NonZero => s!("from the first reported case"),
        }
    }
}

/// Date of the first point matching `rule`.
pub fn anchor(points: &[Point], rule: AlignRule) -> Option<NaiveDate> {
    points
        .iter()
        .find(|(_, v)| v.is_some_and(|v| rule.hit(v)))
        .map(|(d, _)| *d)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlignedPoint {
    /// Signed days since the anchor date.
    pub day: i64,
    pub date: NaiveDate,
    pub value: Option<i64>,
}

/// Day offsets relative to the anchor of `rule`. `None` when nothing
/// matches: the entity is left out of aligned output.
pub fn align(points: &[Point], rule: AlignRule) -> Option<Vec<AlignedPoint>> {
    let zero = anchor(points, rule)?;
    Some(align_to(points, zero))
}

/// Day offsets relative to a known anchor (e.g. deaths aligned on the day
/// cases first exceeded a threshold).
pub fn align_to(points: &[Point], zero: NaiveDate) -> Vec<AlignedPoint> {
    points
        .iter()
        .map(|&(date, value)| AlignedPoint { day: (date - zero).num_days(), date, value })
        .collect()
}

/// Keep an entity only if its peak value reaches `n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeakAtLeast(pub u64);

impl PeakAtLeast {
    pub fn keeps(&self, points: &[Point]) -> bool {
        points
            .iter()
            .filter_map(|(_, v)| *v)
            .max()
            .is_some_and(|m| m >= self.0 as i64)
    }
}

/// `(date, value per 1M)` points.
pub type RatePoint = (NaiveDate, Option<f64>);

/// `value / population * 1_000_000`. Entities without a (non-zero)
/// population are excluded with a `LookupMiss`.
pub fn per_capita(points: &[Point], key: &EntityKey, population: &PopulationTable) -> Result<Vec<RatePoint>, Issue> {
    let pop = population
        .get(key)
        .filter(|p| *p > 0)
        .ok_or_else(|| Issue::LookupMiss { entity: key.to_string(), table: "population" })?;
    let scale = PER_CAPITA_SCALE / pop as f64;
    Ok(points.iter().map(|&(d, v)| (d, v.map(|v| v as f64 * scale))).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Totals;

    fn d(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, n).unwrap()
    }

    #[test]
    fn rule_boundaries() {
        assert!(!AlignRule::Exceeds(30).hit(30));
        assert!(AlignRule::Exceeds(30).hit(31));
        assert!(AlignRule::NonZero.hit(-1));
        assert!(!AlignRule::NonZero.hit(0));
    }

    #[test]
    fn unknown_measures_give_unknown_deltas() {
        let key = EntityKey::country("Italy");
        let t = |c| Totals { confirmed: Some(c), ..Totals::default() };
        let series = vec![CanonicalRecord::new(d(1), &key, t(1)), CanonicalRecord::new(d(2), &key, t(4))];
        let deltas = daily_deltas(&series);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].confirmed, Some(3));
        assert_eq!(deltas[0].recovered, None);
    }

    #[test]
    fn peak_filter_is_inclusive() {
        let pts = vec![(d(1), Some(99)), (d(2), None), (d(3), Some(100))];
        assert!(PeakAtLeast(100).keeps(&pts));
        assert!(!PeakAtLeast(101).keeps(&pts));
        assert!(!PeakAtLeast(0).keeps(&[(d(1), None)]));
    }
}
