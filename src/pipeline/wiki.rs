// src/pipeline/wiki.rs
// Per-state Wikipedia scrape: today's article plus the last revision of
// every earlier day, one output file per state per day, then one merged file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::{Summary, pool, today};
use crate::config::consts::{WIKI_EXISTING_STOP, WIKI_HISTORY_LIMIT};
use crate::config::options::{RunConfig, WikiState};
use crate::core::net::Fetcher;
use crate::error::{Issue, Result, log_issues};
use crate::extract::{self, ExtractTarget, revisions};
use crate::file::{dated_name, list_with_ext};
use crate::progress::Progress;
use crate::record::{CanonicalRecord, sort_by_date_key};
use crate::reference::ReferenceSet;
use crate::store;

fn state_dir(cfg: &RunConfig, state: &WikiState) -> PathBuf {
    cfg.wiki.dir.join(&state.abbr)
}

fn day_file(cfg: &RunConfig, state: &WikiState, date: NaiveDate) -> PathBuf {
    state_dir(cfg, state).join(dated_name(&state.abbr, date, cfg.format.ext()))
}

fn target(cfg: &RunConfig, state: &WikiState, date: NaiveDate) -> ExtractTarget {
    ExtractTarget { country: cfg.wiki.country.clone(), province: state.name.clone(), date }
}

/// Revisions still to scrape, newest day first. Walking back stops once
/// `WIKI_EXISTING_STOP` days are already on disk: older revisions predate
/// the table or were scraped on an earlier run.
pub fn pending_revisions(
    days: &[revisions::Revision],
    since: NaiveDate,
    exists: impl Fn(NaiveDate) -> bool,
) -> Vec<revisions::Revision> {
    let mut existing = 0;
    let mut out = Vec::new();
    for rev in days.iter().filter(|r| r.date >= since) {
        if exists(rev.date) {
            existing += 1;
        } else if existing < WIKI_EXISTING_STOP {
            out.push(*rev);
        }
    }
    out
}

/// Extract one document and write its day file when anything was found.
fn scrape_document(
    cfg: &RunConfig,
    state: &WikiState,
    html: &str,
    document: &str,
    date: NaiveDate,
    reference: &ReferenceSet,
) -> Result<(Option<PathBuf>, Vec<Issue>)> {
    let found = extract::extract(html, document, &target(cfg, state, date), reference);
    if found.records.is_empty() {
        return Ok((None, found.issues));
    }
    let path = day_file(cfg, state, date);
    store::save_records(&path, &found.records)?;
    Ok((Some(path), found.issues))
}

fn scrape_state(
    cfg: &RunConfig,
    fetcher: &dyn Fetcher,
    state: &WikiState,
    reference: &ReferenceSet,
    summary: &mut Summary,
    progress: Option<&mut dyn Progress>,
) -> Result<()> {
    let article = revisions::article_name(&state.url);

    // current article stands for today and is always refreshed
    let html = fetcher.get_text(&state.url)?;
    let (written, issues) = scrape_document(cfg, state, &html, article, today(), reference)?;
    log_issues(&issues);
    summary.issues += issues.len();
    summary.files.extend(written);

    let history = fetcher.get_text(&revisions::history_url(article, WIKI_HISTORY_LIMIT))?;
    let days = revisions::last_per_day(&revisions::parse_history(&history));
    let pending = pending_revisions(&days, cfg.wiki.since, |d| day_file(cfg, state, d).exists());
    logf!("{}: {} revision days, {} to scrape", state.name, days.len(), pending.len());

    let cache = state_dir(cfg, state).join("html");
    let results = pool::map_with_progress(
        &pending,
        cfg.workers(),
        |_, rev| -> Result<(Option<PathBuf>, Vec<Issue>)> {
            let page = cache.join(format!("{}.html", rev.oldid));
            fetcher.fetch_to(&revisions::revision_url(article, rev.oldid), &page)?;
            let html = fs::read_to_string(&page)?;
            let document = format!("{article}@{}", rev.oldid);
            scrape_document(cfg, state, &html, &document, rev.date, reference)
        },
        progress,
    );

    for (rev, r) in pending.iter().zip(results) {
        match r {
            Ok((written, issues)) => {
                log_issues(&issues);
                summary.issues += issues.len();
                summary.files.extend(written);
            }
            Err(e) => logw!("{} revision {}: {e}", state.name, rev.oldid),
        }
    }
    Ok(())
}

/// Every day file of every configured state, concatenated.
pub fn merge(cfg: &RunConfig) -> Result<Vec<CanonicalRecord>> {
    let mut all = Vec::new();
    for state in &cfg.wiki.states {
        let dir = state_dir(cfg, state);
        if !dir.is_dir() {
            continue;
        }
        for path in list_with_ext(&dir, cfg.format.ext())? {
            match store::load_records(&path) {
                Ok(recs) => all.extend(recs.into_iter().filter(|r| r.date >= cfg.wiki.since)),
                Err(e) => logw!("{}: {e}", path.display()),
            }
        }
    }
    sort_by_date_key(&mut all);
    Ok(all)
}

fn merged_file(cfg: &RunConfig) -> PathBuf {
    let p: &Path = &cfg.wiki.dir;
    p.join(format!("wikipedia-recoveries.{}", cfg.format.ext()))
}

pub fn run(cfg: &RunConfig, fetcher: &dyn Fetcher, mut progress: Option<&mut dyn Progress>) -> Result<Summary> {
    let reference = ReferenceSet::load(&cfg.reference.counties)?;
    let mut summary = Summary::default();

    for state in &cfg.wiki.states {
        logf!("Scraping {}...", state.name);
        let progress = progress.as_mut().map(|p| &mut **p as &mut dyn Progress);
        if let Err(e) = scrape_state(cfg, fetcher, state, &reference, &mut summary, progress) {
            logw!("{}: {e}", state.name);
        }
    }

    let merged = merge(cfg)?;
    summary.records = merged.len();
    let path = merged_file(cfg);
    store::save_records(&path, &merged)?;
    summary.files.push(path);

    summary.log("Wikipedia");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use revisions::Revision;

    #[test]
    fn walk_back_stops_after_existing_days() {
        let d = |n| NaiveDate::from_ymd_opt(2020, 4, n).unwrap();
        let days: Vec<Revision> = (1..=8).rev().map(|n| Revision { date: d(n), oldid: n as u64 }).collect();
        // days 7, 5, 4 already on disk; day 1 is before `since`
        let on_disk = [d(7), d(5), d(4)];
        let pending = pending_revisions(&days, d(2), |x| on_disk.contains(&x));
        let ids: Vec<u64> = pending.iter().map(|r| r.oldid).collect();
        assert_eq!(ids, vec![8, 6]);
    }

    #[test]
    fn offline_run_skips_unfetchable_states() {
        use crate::core::net::OfflineFetcher;
        use crate::progress::LogProgress;

        let mut dir = std::env::temp_dir();
        dir.push("covid_munge_wiki_offline");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let counties = dir.join("counties.csv");
        fs::write(&counties, "Country,Province,Region\nUS,Maine,York\n").unwrap();

        let mut cfg = RunConfig::default();
        cfg.reference.counties = counties;
        cfg.wiki.dir = dir.join("wiki");
        cfg.wiki.states.truncate(2);

        let mut progress = LogProgress::default();
        let summary = run(&cfg, &OfflineFetcher, Some(&mut progress)).unwrap();
        assert_eq!(summary.records, 0);
        assert_eq!(summary.files, vec![merged_file(&cfg)]);
        assert!(merged_file(&cfg).exists());
    }
}
