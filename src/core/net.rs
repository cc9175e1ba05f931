// src/core/net.rs
// Blocking HTTP fetch with an on-disk cache.

use std::{
    fs,
    path::Path,
    thread,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::{
    config::consts::{JITTER_MS, REQUEST_PAUSE_MS, USER_AGENT},
    error::{Error, Result},
    file::ensure_parent,
};

/// Where raw documents come from. Pipelines only see this trait, so tests
/// and `--offline` runs can swap in a fetcher that never touches the network.
pub trait Fetcher: Sync {
    /// Download `url` into `path` unless `path` already exists.
    /// Returns `true` when a download happened.
    fn fetch_to(&self, url: &str, path: &Path) -> Result<bool>;

    /// Fetch a page that is not cached (e.g. revision history listings).
    fn get_text(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    pause: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, pause: Duration::from_millis(REQUEST_PAUSE_MS) })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        logd!("GET {url}");
        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            return Err(Error::Status { status: resp.status().as_u16(), url: url.to_string() });
        }
        Ok(resp)
    }

    fn be_polite(&self) {
        thread::sleep(self.pause + jitter());
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_to(&self, url: &str, path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        ensure_parent(path)?;
        let bytes = self.get(url)?.bytes()?;
        // write-then-rename: `path` only ever holds a complete download
        let tmp = path.with_extension("part");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        self.be_polite();
        Ok(true)
    }

    fn get_text(&self, url: &str) -> Result<String> {
        let text = self.get(url)?.text()?;
        self.be_polite();
        Ok(text)
    }
}

/// Fetcher for `--offline` runs: only files already on disk count.
pub struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    fn fetch_to(&self, url: &str, path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            Err(Error::Invalid(format!("offline: {} not materialized ({url})", path.display())))
        }
    }

    fn get_text(&self, url: &str) -> Result<String> {
        Err(Error::Invalid(format!("offline: cannot fetch {url}")))
    }
}

fn jitter() -> Duration {
    if JITTER_MS == 0 {
        return Duration::ZERO;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    Duration::from_millis(nanos % JITTER_MS)
}
