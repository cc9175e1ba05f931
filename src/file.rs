// src/file.rs

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;

use crate::error::{Error, Result};

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(Error::Invalid(format!("Path exists but is not a directory: {}", dir.display())));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    Ok(())
}

pub fn looks_like_dir_hint(p: &Path) -> bool {
    let s = p.to_string_lossy();
    s.ends_with('/') || s.ends_with('\\')
}

pub fn normalize_separators(p: &str) -> String {
    let sep = std::path::MAIN_SEPARATOR;
    p.chars().map(|c| if c=='/'||c=='\\' { sep } else { c }).collect()
}

/// `-o` handling: empty → `default_filename` in the working dir; a directory
/// (existing or with a trailing separator) → `default_filename` inside it;
/// anything else is taken as the file path.
pub fn resolve_out_path(user_o: &str, default_filename: &str) -> Result<PathBuf> {
    if user_o.is_empty() { return Ok(PathBuf::from(default_filename)); }
    let p = PathBuf::from(normalize_separators(user_o));
    if looks_like_dir_hint(&p) || p.is_dir() {
        ensure_directory(&p)?; Ok(p.join(default_filename))
    } else {
        Ok(p)
    }
}

/// JHU daily report name: `MM-DD-YYYY.csv`.
pub fn jhu_report_name(date: NaiveDate) -> String {
    format!("{}.csv", date.format("%m-%d-%Y"))
}

/// Per-state per-day extraction output: `<ABBR>-YYYY-MM-DD.<ext>`.
pub fn dated_name(stem: &str, date: NaiveDate, ext: &str) -> String {
    format!("{stem}-{}.{ext}", date.format("%Y-%m-%d"))
}

/// Files in `dir` with extension `ext`, sorted by name.
pub fn list_with_ext(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if matches && path.is_file() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        let d = NaiveDate::from_ymd_opt(2020, 3, 22).unwrap();
        assert_eq!(jhu_report_name(d), "03-22-2020.csv");
        assert_eq!(dated_name("VA", d, "tsv"), "VA-2020-03-22.tsv");
    }

    #[test]
    fn dir_hint() {
        assert!(looks_like_dir_hint(Path::new("out/")));
        assert!(!looks_like_dir_hint(Path::new("out.csv")));
    }
}
