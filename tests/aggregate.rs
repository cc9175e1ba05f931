// tests/aggregate.rs
use chrono::NaiveDate;

use covid_munge::aggregate::Aggregator;
use covid_munge::record::{CanonicalRecord, EntityKey, Field, Granularity, Totals};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
}

fn county(d: u32, state: &str, name: &str, confirmed: u64, recovered: Option<u64>) -> CanonicalRecord {
    let totals = Totals { confirmed: Some(confirmed), deaths: Some(0), recovered, active: None };
    CanonicalRecord::new(day(d), &EntityKey::region("US", state, name), totals)
}

#[test]
fn counties_sum_into_their_state() {
    let records = vec![
        county(1, "Ohio", "Adams", 10, None),
        county(1, "Ohio", "Allen", 20, Some(2)),
        county(1, "Ohio", "Ashland", 30, None),
    ];
    let out = Aggregator::default().aggregate(&records, Granularity::Province);

    assert_eq!(out.len(), 1);
    let ohio = &out[0];
    assert_eq!(ohio.key(), EntityKey::province("US", "Ohio"));
    assert_eq!(ohio.get(Field::Confirmed), Some(60));
    assert_eq!(ohio.get(Field::Recovered), Some(2));
    assert_eq!(ohio.get(Field::Active), None);
}

#[test]
fn excluded_names_contribute_nothing() {
    let records = vec![
        county(1, "Illinois", "Cook", 10, None),
        county(1, "Illinois", "Unassigned", 99, None),
        county(1, "Grand Princess", "Ship", 7, None),
    ];
    let out = Aggregator::default().aggregate(&records, Granularity::Province);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].get(Field::Confirmed), Some(10));
}

#[test]
fn days_stay_separate_and_flags_propagate() {
    let mut flagged = county(2, "Utah", "Salt Lake", 5, None);
    flagged.flagged = true;
    let records = vec![county(1, "Utah", "Salt Lake", 3, None), flagged, county(2, "Utah", "Utah", 1, None)];

    let out = Aggregator::default().aggregate(&records, Granularity::Province);
    assert_eq!(out.len(), 2);
    assert_eq!((out[0].date, out[0].flagged), (day(1), false));
    assert_eq!((out[1].date, out[1].flagged), (day(2), true));
    assert_eq!(out[1].get(Field::Confirmed), Some(6));
}

#[test]
fn country_level_rolls_up_everything() {
    let records = vec![county(1, "Ohio", "Adams", 1, None), county(1, "Utah", "Utah", 2, None)];
    let out = Aggregator::default().aggregate(&records, Granularity::Country);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].key(), EntityKey::country("US"));
    assert_eq!(out[0].get(Field::Confirmed), Some(3));
}

#[test]
fn state_view_keeps_us_states_only() {
    let mut records = vec![
        county(1, "Washington", "King", 4, None),
        county(1, "King County, WA", "King", 100, None),
    ];
    records.push(CanonicalRecord::new(
        day(1),
        &EntityKey::province("Canada", "Ontario"),
        Totals { confirmed: Some(9), ..Totals::default() },
    ));

    let out = Aggregator::default().us_state_view(&records);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].province.as_deref(), Some("Washington"));
    assert_eq!(out[0].get(Field::Confirmed), Some(4));
}

#[test]
fn custom_exclusions_replace_defaults() {
    let records = vec![county(1, "Ohio", "Adams", 1, None), county(1, "Ohio", "Unassigned", 2, None)];
    let out = Aggregator::new(vec!["Adams".into()]).aggregate(&records, Granularity::Province);
    assert_eq!(out[0].get(Field::Confirmed), Some(2));
}
