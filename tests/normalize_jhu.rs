// tests/normalize_jhu.rs
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use covid_munge::csv::parse_table;
use covid_munge::error::Issue;
use covid_munge::normalize::{SchemaVersion, jhu};
use covid_munge::record::Field;

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("covid_munge_jhu_{}", name));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

const LEGACY: &str = "\u{feff}Province/State,Country/Region,Last Update,Confirmed,Deaths,Recovered,Latitude,Longitude
Hubei,Mainland China,2020-03-01T10:13:19,66907,2761,31536,30.9756,112.2707
,Italy,2020-03-01T23:23:02,1694,34,83,43.0000,12.0000
New York,US,2020-03-01T00:00:00,1,,0,40.7,-74.0
";

const COUNTY: &str = "FIPS,Admin2,Province_State,Country_Region,Last_Update,Lat,Long_,Confirmed,Deaths,Recovered,Active,Combined_Key
36059,Nassau,New York,US,2020-03-22 23:45:00,40.74,-73.58,1900,4,0,1896,\"Nassau, New York, US\"
,,,,2020-03-22 23:45:00,0,0,5,0,0,5,
36103,Suffolk,New York,US,2020-03-22 23:45:00,40.88,-72.80,n/a,1,0,0,\"Suffolk, New York, US\"
";

#[test]
fn legacy_layout_has_no_region_or_active() {
    let date = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
    assert_eq!(SchemaVersion::for_date(date), SchemaVersion::Legacy);

    let table = parse_table(LEGACY.as_bytes(), b',').unwrap();
    let out = jhu::normalize(&table, date, SchemaVersion::Legacy, "03-01-2020.csv");

    assert!(out.issues.is_empty());
    assert_eq!(out.records.len(), 3);

    let hubei = &out.records[0];
    assert_eq!(hubei.country, "Mainland China");
    assert_eq!(hubei.province.as_deref(), Some("Hubei"));
    assert_eq!(hubei.region, None);
    assert_eq!(hubei.get(Field::Recovered), Some(31536));
    assert_eq!(hubei.get(Field::Active), None);

    assert_eq!(out.records[1].province, None);
    // blank count cell is a zero, not a failure
    assert_eq!(out.records[2].get(Field::Deaths), Some(0));
    assert!(!out.records[2].flagged);
}

#[test]
fn county_layout_carries_region_and_active() {
    let date = NaiveDate::from_ymd_opt(2020, 3, 22).unwrap();
    assert_eq!(SchemaVersion::for_date(date), SchemaVersion::County);

    let table = parse_table(COUNTY.as_bytes(), b',').unwrap();
    let out = jhu::normalize(&table, date, SchemaVersion::County, "03-22-2020.csv");

    assert_eq!(out.records.len(), 2);
    let nassau = &out.records[0];
    assert_eq!(nassau.region.as_deref(), Some("Nassau"));
    assert_eq!(nassau.get(Field::Active), Some(1896));
    assert_eq!(nassau.date, date);

    // row 2 has no country
    assert!(
        out.issues
            .iter()
            .any(|i| matches!(i, Issue::SchemaMismatch { row: 2, field: "country", .. }))
    );

    let suffolk = &out.records[1];
    assert_eq!(suffolk.get(Field::Confirmed), Some(0));
    assert!(suffolk.flagged);
    assert!(
        out.issues
            .iter()
            .any(|i| matches!(i, Issue::ParseFailure { field: Field::Confirmed, .. }))
    );
}

#[test]
fn report_file_is_dated_by_its_name() {
    let dir = tmp_dir("read");
    let path = dir.join("03-22-2020.csv");
    fs::write(&path, COUNTY).unwrap();

    let out = jhu::read_report(&path).unwrap();
    assert_eq!(out.records.len(), 2);
    assert!(
        out.records
            .iter()
            .all(|r| r.date == NaiveDate::from_ymd_opt(2020, 3, 22).unwrap())
    );
}
