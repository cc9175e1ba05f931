// src/reference.rs
//! Static reference data: the sub-region vocabulary and population lookup.
//! Loaded once per run, read-only afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use crate::csv::{RawTable, read_table};
use crate::error::{Error, Result};
use crate::record::EntityKey;

/// Country assumed when a reference file has no `Country` column.
pub const DEFAULT_COUNTRY: &str = "US";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceEntity {
    pub country: String,
    pub province: String,
    pub region: String,
}

/// Valid sub-region names per (country, province).
#[derive(Clone, Debug, Default)]
pub struct ReferenceSet {
    entities: Vec<ReferenceEntity>,
}

impl ReferenceSet {
    pub fn new(entities: Vec<ReferenceEntity>) -> Self {
        Self { entities }
    }

    /// `Country,Province,Region` CSV; `Country` may be absent.
    pub fn load(path: &Path) -> Result<Self> {
        let set = Self::from_table(&read_table(path)?)?;
        logd!("Loaded {} reference entities from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn from_table(t: &RawTable) -> Result<Self> {
        let province = t
            .column(&["Province", "State"])
            .ok_or_else(|| Error::Invalid(s!("reference table has no Province column")))?;
        let region = t
            .column(&["Region", "County"])
            .ok_or_else(|| Error::Invalid(s!("reference table has no Region column")))?;
        let country = t.column(&["Country"]);

        let entities = t
            .rows
            .iter()
            .filter_map(|r| {
                let region = r.get(region)?.trim();
                if region.is_empty() {
                    return None;
                }
                let country = country
                    .and_then(|c| r.get(c))
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .unwrap_or(DEFAULT_COUNTRY);
                Some(ReferenceEntity {
                    country: country.to_string(),
                    province: r.get(province)?.trim().to_string(),
                    region: region.to_string(),
                })
            })
            .collect();
        Ok(Self { entities })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Sub-region names of one province.
    pub fn names_for(&self, country: &str, province: &str) -> Vec<&str> {
        self.entities
            .iter()
            .filter(|e| e.country == country && e.province == province)
            .map(|e| e.region.as_str())
            .collect()
    }
}

/// Population by entity. Keys are matched exactly.
#[derive(Clone, Debug, Default)]
pub struct PopulationTable {
    map: BTreeMap<EntityKey, u64>,
}

impl PopulationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// CSV with a `Population` column and any of `Country`/`Location`,
    /// `Province`/`State`, `Region`/`County` as identity.
    pub fn load(path: &Path) -> Result<Self> {
        let table = Self::from_table(&read_table(path)?)?;
        logd!("Loaded {} population rows from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_table(t: &RawTable) -> Result<Self> {
        let pop = t
            .column(&["Population"])
            .ok_or_else(|| Error::Invalid(s!("population table has no Population column")))?;
        let country = t.column(&["Country", "Location"]);
        let province = t.column(&["Province", "State"]);
        let region = t.column(&["Region", "County"]);

        let cell = |r: &Vec<String>, col: Option<usize>| -> Option<String> {
            col.and_then(|c| r.get(c))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let mut out = Self::new();
        for r in &t.rows {
            let Some(n) = r.get(pop).and_then(|v| crate::core::sanitize::parse_count(v)) else {
                logd!("population row without a usable count: {:?}", r);
                continue;
            };
            let key = EntityKey {
                country: cell(r, country).unwrap_or_else(|| s!(DEFAULT_COUNTRY)),
                province: cell(r, province),
                region: cell(r, region),
            };
            out.insert(key, n);
        }
        Ok(out)
    }

    pub fn insert(&mut self, key: EntityKey, population: u64) {
        self.map.insert(key, population);
    }

    pub fn get(&self, key: &EntityKey) -> Option<u64> {
        self.map.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, u64)> {
        self.map.iter().map(|(k, v)| (k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        }
    }

    #[test]
    fn reference_defaults_country() {
        let t = table(&["Province", "Region"], &[&["Virginia", "Fairfax"], &["Maine", "York"]]);
        let set = ReferenceSet::from_table(&t).unwrap();
        assert_eq!(set.names_for("US", "Virginia"), vec!["Fairfax"]);
        assert!(set.names_for("US", "Ohio").is_empty());
    }

    #[test]
    fn population_by_state() {
        let t = table(&["State", "Population"], &[&["Virginia", "8,535,519"], &["Guam", ""]]);
        let pop = PopulationTable::from_table(&t).unwrap();
        assert_eq!(pop.get(&EntityKey::province("US", "Virginia")), Some(8_535_519));
        assert_eq!(pop.len(), 1);
    }
}
