// src/pipeline/ecdc.rs
// ECDC feed: cumulate, reconcile, then daily series per country aligned on
// the first day with more than N cases.

use std::collections::BTreeMap;

use super::{Summary, out_file};
use crate::config::options::RunConfig;
use crate::core::net::Fetcher;
use crate::error::{Result, log_issues};
use crate::metrics::{
    AlignRule, DailyDelta, PeakAtLeast, Point, align, align_to, anchor, daily_deltas_all, delta_column,
    per_capita,
};
use crate::normalize::ecdc;
use crate::present::{Chart, ChartSink, Series, XAxis};
use crate::reconcile::reconcile_all;
use crate::record::{CanonicalRecord, DateWindow, EntityKey, Field};
use crate::reference::PopulationTable;
use crate::store;

/// Daily series of every country whose peak daily cases reach the filter.
pub fn daily_by_country(records: &[CanonicalRecord], peak: PeakAtLeast) -> BTreeMap<EntityKey, Vec<DailyDelta>> {
    let mut by_country: BTreeMap<EntityKey, Vec<DailyDelta>> = BTreeMap::new();
    for d in daily_deltas_all(records) {
        by_country.entry(d.key.clone()).or_default().push(d);
    }
    let before = by_country.len();
    by_country.retain(|_, deltas| peak.keeps(&delta_column(deltas, Field::Confirmed)));
    logd!("ECDC: {} of {before} countries pass the peak filter", by_country.len());
    by_country
}

/// Cumulative records with the day offset of their country (`None` when
/// the country never passes the rule).
pub fn augment(
    records: &[CanonicalRecord],
    daily: &BTreeMap<EntityKey, Vec<DailyDelta>>,
    rule: AlignRule,
) -> Vec<(CanonicalRecord, Option<i64>)> {
    let anchors: BTreeMap<&EntityKey, _> = daily
        .iter()
        .map(|(k, d)| (k, anchor(&delta_column(d, Field::Confirmed), rule)))
        .collect();
    records
        .iter()
        .filter_map(|r| {
            let zero = anchors.get(&r.key())?;
            Some((r.clone(), zero.map(|z| (r.date - z).num_days())))
        })
        .collect()
}

fn aligned_chart(
    title: &str,
    picks: &[(EntityKey, &Vec<DailyDelta>)],
    rule: AlignRule,
    field: Field,
    sink: &mut dyn ChartSink,
) {
    let mut chart = Chart::new(format!("{title} {}", rule.describe()), XAxis::DayOffset);
    for (key, deltas) in picks {
        let Some(zero) = anchor(&delta_column(deltas, Field::Confirmed), rule) else {
            logd!("{key}: never passes the alignment rule");
            continue;
        };
        chart.push(Series::aligned(key.leaf(), &align_to(&delta_column(deltas, field), zero)));
    }
    sink.show(&chart);
}

fn per_capita_chart(
    title: &str,
    picks: &[(EntityKey, &Vec<DailyDelta>)],
    rule: AlignRule,
    field: Field,
    population: &PopulationTable,
    sink: &mut dyn ChartSink,
) {
    let mut chart = Chart::new(title, XAxis::DayOffset);
    for (key, deltas) in picks {
        let cases: Vec<Point> = delta_column(deltas, Field::Confirmed);
        let Some(days) = align(&cases, rule) else {
            continue;
        };
        match per_capita(&delta_column(deltas, field), key, population) {
            Ok(rates) => chart.push(Series::aligned_rates(key.leaf(), &rates, &days)),
            Err(issue) => log_issues(&[issue]),
        }
    }
    sink.show(&chart);
}

pub fn run(cfg: &RunConfig, fetcher: &dyn Fetcher, sink: &mut dyn ChartSink) -> Result<Summary> {
    let opts = &cfg.ecdc;
    if fetcher.fetch_to(&opts.url, &opts.input)? {
        logf!("ECDC: downloaded {}", opts.input.display());
    }

    let data = ecdc::read_export(&opts.input)?;
    log_issues(&data.issues);
    let mut summary = Summary { issues: data.issues.len(), ..Default::default() };

    let records = match DateWindow::spanning(&data.records) {
        Some(w) => reconcile_all(&data.records, &w, cfg.workers()),
        None => Vec::new(),
    };
    summary.records = records.len();
    let path = out_file(cfg, "ecdc-canonical");
    store::save_records(&path, &records)?;
    summary.files.push(path);

    let daily = daily_by_country(&records, PeakAtLeast(opts.peak_at_least));
    let exceeds = AlignRule::Exceeds(opts.align_exceeds);
    let path = out_file(cfg, "ecdc-augmented");
    store::save_aligned(&path, &augment(&records, &daily, exceeds))?;
    summary.files.push(path);

    let picks: Vec<(EntityKey, &Vec<DailyDelta>)> = opts
        .countries
        .iter()
        .filter_map(|c| {
            let key = EntityKey::country(c.clone());
            match daily.get(&key) {
                Some(d) => Some((key, d)),
                None => {
                    logw!("ECDC: {c} not in the filtered feed");
                    None
                }
            }
        })
        .collect();

    for rule in [exceeds, AlignRule::NonZero] {
        aligned_chart("Daily confirmed cases", &picks, rule, Field::Confirmed, sink);
        aligned_chart("Daily deaths", &picks, rule, Field::Deaths, sink);
    }

    let mut outbreak = Chart::new("Daily confirmed cases from the start of the outbreak", XAxis::Date);
    for (key, deltas) in &picks {
        let cases = delta_column(deltas, Field::Confirmed);
        if let Some(zero) = anchor(&cases, AlignRule::NonZero) {
            let from: Vec<Point> = cases.into_iter().filter(|(d, _)| *d >= zero).collect();
            outbreak.push(Series::dated(key.leaf(), &from));
        }
    }
    sink.show(&outbreak);

    let rate_picks: Vec<_> = picks
        .iter()
        .filter(|(k, _)| !opts.per_capita_skip.contains(&k.country))
        .cloned()
        .collect();
    per_capita_chart("Daily confirmed cases per 1M people", &rate_picks, exceeds, Field::Confirmed, &data.population, sink);
    per_capita_chart("Daily deaths per 1M people", &rate_picks, exceeds, Field::Deaths, &data.population, sink);

    summary.log("ECDC");
    Ok(summary)
}
