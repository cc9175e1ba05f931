// src/config/consts.rs

use chrono::NaiveDate;

// Local store (logs, scratch)
pub const STORE_DIR: &str = ".store";
pub const LOG_FILE: &str = "debug.log";

// Materialized inputs and outputs
pub const DEFAULT_DATA_DIR: &str = "COVID-19/ORIGINAL";
pub const DEFAULT_OUT_DIR: &str = "COVID-19/OUTPUTS";
pub const DEFAULT_WIKI_DIR: &str = "COVID-19/WIKIPEDIA";
pub const JHU_SUBDIR: &str = "JHU-DAILY";
pub const DEFAULT_COUNTIES_FILE: &str = "COVID-19/REFERENCE/us-counties.csv";
pub const DEFAULT_POPULATION_FILE: &str = "COVID-19/ORIGINAL/us-states-population-2019.csv";

// Sources
pub const JHU_DAILY_URL: &str =
    "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_daily_reports/";
pub const WIKI_INDEX_URL: &str = "https://en.wikipedia.org/w/index.php";
pub const ECDC_CSV_URL: &str = "https://opendata.ecdc.europa.eu/covid19/casedistribution/csv";
pub const USER_AGENT: &str = concat!("covid_munge/", env!("CARGO_PKG_VERSION"));

// JHU archive timeline
pub const JHU_FIRST_DAY: (i32, u32, u32) = (2020, 1, 22);
/// First day of the county-level (Admin2) layout.
pub const JHU_COUNTY_LAYOUT_FROM: (i32, u32, u32) = (2020, 3, 22);

// Derived metrics
pub const PER_CAPITA_SCALE: f64 = 1_000_000.0;
pub const ECDC_PEAK_AT_LEAST: u64 = 100;
pub const ECDC_ALIGN_EXCEEDS: u64 = 30;
pub const STATE_CHART_FROM: (i32, u32, u32) = (2020, 3, 6);

// Wikipedia scraping
/// Stop walking back through revisions after this many already-saved days.
pub const WIKI_EXISTING_STOP: usize = 3;
pub const WIKI_HISTORY_LIMIT: usize = 5000;

// Concurrency
pub const WORKERS: usize = 4;
pub const REQUEST_PAUSE_MS: u64 = 75; // be polite
pub const JITTER_MS: u64 = 50; // extra 0..50 ms

/// Calendar date from a `(y, m, d)` constant above.
pub fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}
