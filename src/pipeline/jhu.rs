// src/pipeline/jhu.rs
// JHU daily archive: fetch → normalize → US state view → reconcile →
// population join → deltas → files and charts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Days;

use super::{Summary, out_file, pool, today};
use crate::aggregate::Aggregator;
use crate::config::consts::JHU_DAILY_URL;
use crate::config::options::{RegionPick, RunConfig};
use crate::core::net::Fetcher;
use crate::error::{Issue, Result, log_issues};
use crate::file::jhu_report_name;
use crate::metrics::{DailyDelta, column, daily_deltas, daily_deltas_all, delta_column};
use crate::normalize::{Normalized, jhu};
use crate::present::{Chart, ChartSink, Series, XAxis};
use crate::progress::Progress;
use crate::reconcile::{group_by_key, reconcile, reconcile_all};
use crate::record::{CanonicalRecord, DateWindow, EntityKey, Field};
use crate::reference::PopulationTable;
use crate::store;

/// Days to cover: configured start through the configured end (or yesterday).
pub fn window(cfg: &RunConfig) -> Result<DateWindow> {
    let last = cfg
        .jhu
        .end
        .unwrap_or_else(|| today().checked_sub_days(Days::new(1)).unwrap_or(cfg.jhu.start));
    DateWindow::new(cfg.jhu.start, last)
}

/// Materialize one report per day. Days that cannot be fetched are logged
/// and left out; reconciliation fills them later.
pub fn fetch_reports(
    cfg: &RunConfig,
    fetcher: &dyn Fetcher,
    window: &DateWindow,
    progress: Option<&mut dyn Progress>,
) -> Vec<PathBuf> {
    let dir = cfg.jhu_daily_dir();
    let days: Vec<_> = window.days().collect();
    let fetched = pool::map_with_progress(
        &days,
        cfg.workers(),
        |_, day| {
            let name = jhu_report_name(*day);
            let path = dir.join(&name);
            match fetcher.fetch_to(&join!(JHU_DAILY_URL, &name), &path) {
                Ok(true) => {
                    logd!("fetched {name}");
                    Some(path)
                }
                Ok(false) => Some(path),
                Err(e) => {
                    logw!("{name}: {e}");
                    None
                }
            }
        },
        progress,
    );
    fetched.into_iter().flatten().collect()
}

/// Normalize every report file (in parallel); unreadable files are logged.
pub fn load_reports(paths: &[PathBuf], workers: usize) -> Normalized {
    let parts = pool::map_indexed(paths, workers, |_, p| (p.clone(), jhu::read_report(p)));
    let mut out = Normalized::default();
    for (path, part) in parts {
        match part {
            Ok(n) => {
                out.records.extend(n.records);
                out.issues.extend(n.issues);
            }
            Err(e) => loge!("{}: {e}", path.display()),
        }
    }
    out
}

/// Inner join with population; entities without a population are
/// reported once each and left out.
pub fn join_population(
    records: &[CanonicalRecord],
    population: &PopulationTable,
) -> (Vec<(CanonicalRecord, u64)>, Vec<Issue>) {
    let mut rows = Vec::with_capacity(records.len());
    let mut issues = Vec::new();
    for (key, series) in group_by_key(records) {
        match population.get(&key) {
            Some(pop) => rows.extend(series.into_iter().map(|r| (r, pop))),
            None => issues.push(Issue::LookupMiss { entity: key.to_string(), table: "population" }),
        }
    }
    rows.sort_by(|a, b| a.0.cmp_date_key(&b.0));
    (rows, issues)
}

fn region_charts(records: &[CanonicalRecord], pick: &RegionPick, sink: &mut dyn ChartSink) {
    let key = EntityKey::region(pick.country.clone(), pick.province.clone(), pick.region.clone());
    let mut series: Vec<CanonicalRecord> = records.iter().filter(|r| r.key() == key).cloned().collect();
    let Some(window) = DateWindow::spanning(&series) else {
        logw!("{key}: no records, charts skipped");
        return;
    };
    series.sort_by_key(|r| r.date);
    let series = reconcile(&series, &window);
    let name = format!("{}, {}", pick.region, pick.province);

    let mut cumulative = Chart::new(format!("{name}: cumulative"), XAxis::Date);
    for field in [Field::Confirmed, Field::Deaths, Field::Recovered, Field::Active] {
        cumulative.push(Series::dated(field.label(), &column(&series, field)));
    }
    sink.show(&cumulative);

    let deltas = daily_deltas(&series);
    let mut daily = Chart::new(format!("{name}: daily"), XAxis::Date);
    for field in [Field::Confirmed, Field::Deaths] {
        daily.push(Series::dated(field.label(), &delta_column(&deltas, field)));
    }
    sink.show(&daily);
}

fn state_charts(states: &[CanonicalRecord], cfg: &RunConfig, sink: &mut dyn ChartSink) {
    let recent: Vec<CanonicalRecord> = states
        .iter()
        .filter(|r| r.date >= cfg.jhu.state_chart_from)
        .cloned()
        .collect();
    let mut by_state: BTreeMap<EntityKey, Vec<DailyDelta>> = BTreeMap::new();
    for d in daily_deltas_all(&recent) {
        by_state.entry(d.key.clone()).or_default().push(d);
    }

    for (field, title) in [
        (Field::Deaths, "Daily Deaths for all U.S. States"),
        (Field::Confirmed, "Daily Confirmed Cases for all U.S. States"),
    ] {
        let mut chart = Chart::new(title, XAxis::Date);
        for (key, deltas) in &by_state {
            chart.push(Series::dated(key.leaf(), &delta_column(deltas, field)));
        }
        sink.show(&chart);
    }
}

pub fn run(
    cfg: &RunConfig,
    fetcher: &dyn Fetcher,
    sink: &mut dyn ChartSink,
    progress: Option<&mut dyn Progress>,
) -> Result<Summary> {
    let window = window(cfg)?;
    logf!("JHU: {} to {}", window.first, window.last);

    let paths = fetch_reports(cfg, fetcher, &window, progress);
    let normalized = load_reports(&paths, cfg.workers());
    log_issues(&normalized.issues);
    let mut summary = Summary { issues: normalized.issues.len(), ..Default::default() };

    let mut canonical = normalized.records;
    crate::record::sort_by_date_key(&mut canonical);
    let path = out_file(cfg, "jhu-canonical");
    store::save_records(&path, &canonical)?;
    summary.files.push(path);

    let states = Aggregator::default().us_state_view(&canonical);
    let states = match DateWindow::spanning(&states) {
        Some(w) => reconcile_all(&states, &w, cfg.workers()),
        None => Vec::new(),
    };
    summary.records = states.len();
    let path = out_file(cfg, "jhu-us-states");
    store::save_records(&path, &states)?;
    summary.files.push(path);

    let path = out_file(cfg, "jhu-us-states-daily");
    store::save_deltas(&path, &daily_deltas_all(&states))?;
    summary.files.push(path);

    if let Some(path) = population_file(cfg) {
        let population = PopulationTable::load(&path)?;
        let (rows, issues) = join_population(&states, &population);
        log_issues(&issues);
        summary.issues += issues.len();
        let path = out_file(cfg, "jhu-us-states-population");
        store::save_with_population(&path, &rows)?;
        summary.files.push(path);
    }

    for pick in &cfg.jhu.regions {
        region_charts(&canonical, pick, sink);
    }
    state_charts(&states, cfg, sink);

    summary.log("JHU");
    Ok(summary)
}

fn population_file(cfg: &RunConfig) -> Option<PathBuf> {
    let p: &Path = &cfg.reference.population;
    if p.exists() {
        Some(p.to_path_buf())
    } else {
        logw!("population file {} not found, skipping the join", p.display());
        None
    }
}
