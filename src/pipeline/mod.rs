// src/pipeline/mod.rs
//! The three end-to-end runs (JHU, Wikipedia, ECDC) and the worker pool
//! they share. Every run works from materialized files: the fetcher fills
//! the data directory first, then everything downstream reads from disk.

pub mod ecdc;
pub mod jhu;
pub mod pool;
pub mod wiki;

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::config::options::RunConfig;
use crate::core::net::{Fetcher, HttpFetcher, OfflineFetcher};
use crate::error::Result;

/// What a run produced.
#[derive(Clone, Debug, Default)]
pub struct Summary {
    pub records: usize,
    pub issues: usize,
    pub files: Vec<PathBuf>,
}

impl Summary {
    pub fn log(&self, name: &str) {
        logf!(
            "{name}: {} records, {} issues, {} files written",
            self.records,
            self.issues,
            self.files.len()
        );
        for f in &self.files {
            logd!("  {}", f.display());
        }
    }
}

/// Network fetcher, or one that only accepts materialized files.
pub fn fetcher_for(cfg: &RunConfig) -> Result<Box<dyn Fetcher>> {
    if cfg.offline {
        logf!("Offline: using materialized files only");
        Ok(Box::new(OfflineFetcher))
    } else {
        Ok(Box::new(HttpFetcher::new()?))
    }
}

/// `<out_dir>/<stem>.<csv|tsv>`
pub fn out_file(cfg: &RunConfig, stem: &str) -> PathBuf {
    cfg.out_dir.join(format!("{stem}.{}", cfg.format.ext()))
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
