// tests/store_roundtrip.rs
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use covid_munge::metrics::daily_deltas;
use covid_munge::record::{CanonicalRecord, EntityKey, Totals};
use covid_munge::store::{RECORD_HEADERS, load_records, save_deltas, save_records};

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("covid_munge_store_{}", name));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

fn sample() -> Vec<CanonicalRecord> {
    let d = |n| NaiveDate::from_ymd_opt(2020, 3, n).unwrap();
    let county = EntityKey::region("US", "New York", "Nassau");
    let mut flagged = CanonicalRecord::new(
        d(23),
        &county,
        Totals { confirmed: Some(1_900), deaths: Some(0), recovered: Some(0), active: None },
    );
    flagged.flagged = true;
    vec![
        CanonicalRecord::new(
            d(22),
            &county,
            Totals { confirmed: Some(1_234), deaths: Some(4), recovered: Some(0), active: None },
        ),
        flagged,
        CanonicalRecord::new(d(22), &EntityKey::country("Italy"), Totals { confirmed: Some(59_138), ..Totals::default() }),
    ]
}

#[test]
fn csv_and_tsv_reload_identically() {
    let dir = tmp_dir("roundtrip");
    for name in ["records.csv", "records.tsv"] {
        let path = dir.join("nested").join(name);
        save_records(&path, &sample()).unwrap();
        assert_eq!(load_records(&path).unwrap(), sample());
    }

    let tsv = fs::read_to_string(dir.join("nested/records.tsv")).unwrap();
    assert_eq!(tsv.lines().next().unwrap(), RECORD_HEADERS.join("\t"));
}

#[test]
fn empty_output_still_has_a_header() {
    let dir = tmp_dir("empty");
    let path = dir.join("none.csv");
    save_records(&path, &[]).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.trim_end(), RECORD_HEADERS.join(","));
    assert!(load_records(&path).unwrap().is_empty());
}

#[test]
fn deltas_are_written_per_row() {
    let dir = tmp_dir("deltas");
    let path = dir.join("daily.csv");
    let series: Vec<_> = sample().into_iter().take(2).collect();
    save_deltas(&path, &daily_deltas(&series)).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "2020-03-23,Nassau,New York,US,666,-4,0,");
}
