// src/config/options.rs
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::consts::*;
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn ext(&self) -> &'static str {
        match self { ExportFormat::Csv => "csv", ExportFormat::Tsv => "tsv" }
    }
    pub fn delim(&self) -> u8 {
        match self { ExportFormat::Csv => b',', ExportFormat::Tsv => b'\t' }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencePaths {
    /// `Country,Province,Region` vocabulary of valid sub-regions.
    pub counties: PathBuf,
    /// Population by entity.
    pub population: PathBuf,
}

impl Default for ReferencePaths {
    fn default() -> Self {
        Self {
            counties: PathBuf::from(DEFAULT_COUNTIES_FILE),
            population: PathBuf::from(DEFAULT_POPULATION_FILE),
        }
    }
}

/// One (country, province, region) triple to chart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPick {
    pub country: String,
    pub province: String,
    pub region: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JhuOptions {
    pub start: NaiveDate,
    /// Exclusive end; `None` means today.
    pub end: Option<NaiveDate>,
    pub regions: Vec<RegionPick>,
    /// Charts for the state view only include days after this one.
    pub state_chart_from: NaiveDate,
}

impl Default for JhuOptions {
    fn default() -> Self {
        let pick = |c: &str, p: &str, r: &str| RegionPick {
            country: s!(c), province: s!(p), region: s!(r),
        };
        Self {
            start: ymd(JHU_FIRST_DAY),
            end: None,
            regions: vec![
                pick("US", "Virginia", "Fairfax"),
                pick("US", "New York", "Nassau"),
            ],
            state_chart_from: ymd(STATE_CHART_FROM),
        }
    }
}

/// A state whose article carries a county table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiState {
    pub name: String,
    pub abbr: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiOptions {
    pub dir: PathBuf,
    pub country: String,
    pub states: Vec<WikiState>,
    /// First day of the merged output.
    pub since: NaiveDate,
}

impl Default for WikiOptions {
    fn default() -> Self {
        let st = |name: &str, abbr: &str, page: &str| WikiState {
            name: s!(name),
            abbr: s!(abbr),
            url: join!("https://en.wikipedia.org/wiki/", page),
        };
        Self {
            dir: PathBuf::from(DEFAULT_WIKI_DIR),
            country: s!("US"),
            states: vec![
                st("South Dakota", "SD", "2020_coronavirus_pandemic_in_South_Dakota"),
                st("Illinois", "IL", "2020_coronavirus_pandemic_in_Illinois"),
                st("Maine", "ME", "2020_coronavirus_pandemic_in_Maine"),
                st("New Jersey", "NJ", "2020_coronavirus_pandemic_in_New_Jersey"),
                st("New York", "NY", "2020_coronavirus_pandemic_in_New_York_(state)"),
                st("Maryland", "MD", "2020_coronavirus_pandemic_in_Maryland"),
            ],
            since: ymd(JHU_FIRST_DAY),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcdcOptions {
    /// Local copy of the CSV export (fetched here when missing).
    pub input: PathBuf,
    pub url: String,
    /// Keep a country only once its daily cases reach this value at least once.
    pub peak_at_least: u64,
    /// Day 0 is the first day with daily cases strictly above this value.
    pub align_exceeds: u64,
    pub countries: Vec<String>,
    /// Left out of the per-capita charts.
    pub per_capita_skip: Vec<String>,
}

impl Default for EcdcOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_DATA_DIR).join("ECDC-GEOGRAPHIC-DISTRIBUTION.csv"),
            url: s!(ECDC_CSV_URL),
            peak_at_least: ECDC_PEAK_AT_LEAST,
            align_exceeds: ECDC_ALIGN_EXCEEDS,
            countries: strings![
                "China", "Iran", "United_States_of_America", "Italy",
                "Germany", "France", "Spain", "United_Kingdom",
            ],
            per_capita_skip: strings!["Cases_on_an_international_conveyance_Japan", "Canada"],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub format: ExportFormat,
    pub reference: ReferencePaths,
    pub jhu: JhuOptions,
    pub wiki: WikiOptions,
    pub ecdc: EcdcOptions,
    pub workers: usize,
    /// Never fetch; work only from files already on disk.
    pub offline: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            format: ExportFormat::Csv,
            reference: ReferencePaths::default(),
            jhu: JhuOptions::default(),
            wiki: WikiOptions::default(),
            ecdc: EcdcOptions::default(),
            workers: WORKERS,
            offline: false,
        }
    }
}

impl RunConfig {
    /// Read a TOML config; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            logd!("Config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let cfg: RunConfig = toml::from_str(&text)?;
        logf!("Config: loaded {}", path.display());
        Ok(cfg)
    }

    pub fn jhu_daily_dir(&self) -> PathBuf {
        self.data_dir.join(JHU_SUBDIR)
    }

    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: RunConfig = toml::from_str(
            r#"
            format = "tsv"
            [jhu]
            start = "2020-03-01"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.format, ExportFormat::Tsv);
        assert_eq!(cfg.jhu.start, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(cfg.jhu.regions.len(), 2);
        assert_eq!(cfg.wiki.states.len(), 6);
        assert_eq!(cfg.ecdc.align_exceeds, 30);
    }

    #[test]
    fn export_format_ext_and_delim() {
        assert_eq!(ExportFormat::Csv.ext(), "csv");
        assert_eq!(ExportFormat::Tsv.delim(), b'\t');
    }

    #[test]
    fn missing_file_is_default() {
        let cfg = RunConfig::load(Path::new("definitely/not/here.toml")).unwrap();
        assert_eq!(cfg, RunConfig::default());
    }
}
