// src/record.rs
//! Canonical record shape shared by every source.
//!
//! Every source is mapped onto [`CanonicalRecord`]. A measure of `None` means
//! the source layout does not carry that field ("not reported"), which is
//! different from a reported `Some(0)`.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Numeric measures carried by a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Confirmed,
    Deaths,
    Recovered,
    Active,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Confirmed, Field::Deaths, Field::Recovered, Field::Active];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Confirmed => "Confirmed",
            Field::Deaths => "Deaths",
            Field::Recovered => "Recovered",
            Field::Active => "Active",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Level of an entity key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    Country,
    Province,
    Region,
}

/// Identity of one tracked time series: (country[, province[, region]]).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub country: String,
    pub province: Option<String>,
    pub region: Option<String>,
}

impl EntityKey {
    pub fn country(country: impl Into<String>) -> Self {
        Self { country: country.into(), province: None, region: None }
    }

    pub fn province(country: impl Into<String>, province: impl Into<String>) -> Self {
        Self { country: country.into(), province: Some(province.into()), region: None }
    }

    pub fn region(
        country: impl Into<String>,
        province: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into(),
            province: Some(province.into()),
            region: Some(region.into()),
        }
    }

    /// Key of the enclosing entity at `level`.
    pub fn truncate(&self, level: Granularity) -> EntityKey {
        match level {
            Granularity::Country => EntityKey::country(self.country.clone()),
            Granularity::Province => EntityKey {
                country: self.country.clone(),
                province: self.province.clone(),
                region: None,
            },
            Granularity::Region => self.clone(),
        }
    }

    /// Most specific name in the key (region, else province, else country).
    pub fn leaf(&self) -> &str {
        self.region
            .as_deref()
            .or(self.province.as_deref())
            .unwrap_or(&self.country)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.country)?;
        if let Some(p) = &self.province {
            write!(f, " / {p}")?;
        }
        if let Some(r) = &self.region {
            write!(f, " / {r}")?;
        }
        Ok(())
    }
}

/// Cumulative counts for one entity on one day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub confirmed: Option<u64>,
    pub deaths: Option<u64>,
    pub recovered: Option<u64>,
    pub active: Option<u64>,
}

impl Totals {
    pub const ZERO: Totals = Totals {
        confirmed: Some(0),
        deaths: Some(0),
        recovered: Some(0),
        active: Some(0),
    };

    pub fn get(&self, field: Field) -> Option<u64> {
        match field {
            Field::Confirmed => self.confirmed,
            Field::Deaths => self.deaths,
            Field::Recovered => self.recovered,
            Field::Active => self.active,
        }
    }

    pub fn set(&mut self, field: Field, value: Option<u64>) {
        match field {
            Field::Confirmed => self.confirmed = value,
            Field::Deaths => self.deaths = value,
            Field::Recovered => self.recovered = value,
            Field::Active => self.active = value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub date: NaiveDate,
    pub region: Option<String>,
    pub province: Option<String>,
    pub country: String,
    pub totals: Totals,
    /// A numeric cell failed to parse and was coerced to zero.
    pub flagged: bool,
}

impl CanonicalRecord {
    pub fn new(date: NaiveDate, key: &EntityKey, totals: Totals) -> Self {
        Self {
            date,
            region: key.region.clone(),
            province: key.province.clone(),
            country: key.country.clone(),
            totals,
            flagged: false,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey {
            country: self.country.clone(),
            province: self.province.clone(),
            region: self.region.clone(),
        }
    }

    pub fn get(&self, field: Field) -> Option<u64> {
        self.totals.get(field)
    }

    /// Order used for persistence and plotting: (date, entity key).
    pub fn cmp_date_key(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.country.cmp(&other.country))
            .then_with(|| self.province.cmp(&other.province))
            .then_with(|| self.region.cmp(&other.region))
    }
}

/// Inclusive calendar-day range `[first, last]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateWindow {
    pub fn new(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        if first > last {
            return Err(Error::EmptyWindow { first, last });
        }
        Ok(Self { first, last })
    }

    /// Smallest window covering every record; `None` for no records.
    pub fn spanning(records: &[CanonicalRecord]) -> Option<Self> {
        let first = records.iter().map(|r| r.date).min()?;
        let last = records.iter().map(|r| r.date).max()?;
        Some(Self { first, last })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    pub fn num_days(&self) -> usize {
        (self.last - self.first).num_days() as usize + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let last = self.last;
        self.first.iter_days().take_while(move |d| *d <= last)
    }
}

/// Sort in place by (date, entity key).
pub fn sort_by_date_key(records: &mut [CanonicalRecord]) {
    records.sort_by(CanonicalRecord::cmp_date_key);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_walks_up_the_hierarchy() {
        let k = EntityKey::region("US", "New York", "Nassau");
        assert_eq!(k.truncate(Granularity::Province), EntityKey::province("US", "New York"));
        assert_eq!(k.truncate(Granularity::Country), EntityKey::country("US"));
        assert_eq!(k.truncate(Granularity::Region), k);
        assert_eq!(k.leaf(), "Nassau");
    }

    #[test]
    fn keys_order_none_first() {
        let a = EntityKey::country("US");
        let b = EntityKey::province("US", "Alabama");
        assert!(a < b);
    }

    #[test]
    fn window_days_are_inclusive() {
        let d = |n| NaiveDate::from_ymd_opt(2020, 3, n).unwrap();
        let w = DateWindow::new(d(30), d(31)).unwrap();
        assert_eq!(w.days().collect::<Vec<_>>(), vec![d(30), d(31)]);
        assert_eq!(w.num_days(), 2);
        assert!(DateWindow::new(d(2), d(1)).is_err());
    }
}
