// tests/metrics.rs
use chrono::NaiveDate;

use covid_munge::error::Issue;
use covid_munge::metrics::{AlignRule, align, column, daily_deltas, delta_column, per_capita};
use covid_munge::record::{CanonicalRecord, EntityKey, Field, Totals};
use covid_munge::reference::PopulationTable;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
}

fn series(key: &EntityKey, confirmed: &[u64]) -> Vec<CanonicalRecord> {
    confirmed
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let totals = Totals { confirmed: Some(c), deaths: Some(0), ..Totals::default() };
            CanonicalRecord::new(day(i as u32 + 1), key, totals)
        })
        .collect()
}

#[test]
fn deltas_start_on_the_second_day() {
    let key = EntityKey::country("Italy");
    let deltas = daily_deltas(&series(&key, &[5, 5, 9, 9, 12]));

    let values: Vec<_> = deltas.iter().map(|d| d.confirmed).collect();
    assert_eq!(values, vec![Some(0), Some(4), Some(0), Some(3)]);
    assert_eq!(deltas[0].date, day(2));
    assert!(deltas.iter().all(|d| d.key == key));
    assert!(deltas.iter().all(|d| d.recovered.is_none()));
}

#[test]
fn downward_revision_gives_a_negative_delta() {
    let key = EntityKey::country("Spain");
    let deltas = daily_deltas(&series(&key, &[10, 8]));
    assert_eq!(deltas[0].confirmed, Some(-2));
}

#[test]
fn alignment_counts_days_from_first_exceedance() {
    let key = EntityKey::country("Iran");
    let points = column(&series(&key, &[1, 5, 12, 30, 31, 50]), Field::Confirmed);

    let aligned = align(&points, AlignRule::Exceeds(30)).unwrap();
    let days: Vec<i64> = aligned.iter().map(|p| p.day).collect();
    assert_eq!(days, vec![-4, -3, -2, -1, 0, 1]);
    assert_eq!(aligned[4].date, day(5));
}

#[test]
fn no_exceedance_means_no_aligned_series() {
    let key = EntityKey::country("Malta");
    let points = column(&series(&key, &[1, 2, 3]), Field::Confirmed);
    assert!(align(&points, AlignRule::Exceeds(30)).is_none());
}

#[test]
fn nonzero_rule_anchors_on_first_case() {
    let key = EntityKey::country("Peru");
    let daily = delta_column(&daily_deltas(&series(&key, &[0, 0, 0, 2, 2])), Field::Confirmed);
    let aligned = align(&daily, AlignRule::NonZero).unwrap();
    assert_eq!(aligned.iter().find(|p| p.day == 0).map(|p| p.date), Some(day(4)));
}

#[test]
fn rates_scale_to_one_million() {
    let key = EntityKey::country("Iceland");
    let mut pop = PopulationTable::new();
    pop.insert(key.clone(), 500_000);

    let points = column(&series(&key, &[1, 10]), Field::Confirmed);
    let rates = per_capita(&points, &key, &pop).unwrap();
    assert_eq!(rates[0], (day(1), Some(2.0)));
    assert_eq!(rates[1], (day(2), Some(20.0)));
}

#[test]
fn missing_or_zero_population_is_a_lookup_miss() {
    let key = EntityKey::country("Atlantis");
    let points = column(&series(&key, &[1]), Field::Confirmed);

    let empty = PopulationTable::new();
    assert!(matches!(per_capita(&points, &key, &empty), Err(Issue::LookupMiss { .. })));

    let mut zero = PopulationTable::new();
    zero.insert(key.clone(), 0);
    assert!(matches!(per_capita(&points, &key, &zero), Err(Issue::LookupMiss { .. })));
}
