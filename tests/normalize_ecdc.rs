// tests/normalize_ecdc.rs
use chrono::NaiveDate;

use covid_munge::csv::parse_table;
use covid_munge::error::Issue;
use covid_munge::normalize::ecdc;
use covid_munge::record::{EntityKey, Field};

const EXPORT: &str = "dateRep,day,month,year,cases,deaths,countriesAndTerritories,geoId,countryterritoryCode,popData2018
03/03/2020,3,3,2020,5,1,Andorra,AD,AND,77006
02/03/2020,2,3,2020,-2,0,Andorra,AD,AND,77006
01/03/2020,1,3,2020,1,0,Andorra,AD,AND,77006
02/03/2020,2,3,2020,561,7,Italy,IT,ITA,60431283
01/03/2020,1,3,2020,240,8,Italy,IT,ITA,60431283
01/03/2020,1,3,2020,x,0,Italy,IT,ITA,60431283
bad-date,1,3,2020,1,0,Italy,IT,ITA,60431283
";

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
}

#[test]
fn daily_counts_are_cumulated_oldest_first() {
    let table = parse_table(EXPORT.as_bytes(), b',').unwrap();
    let data = ecdc::normalize(&table, "ecdc.csv");

    let andorra: Vec<_> = data.records.iter().filter(|r| r.country == "Andorra").collect();
    let dates: Vec<_> = andorra.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![day(1), day(2), day(3)]);

    // 1, then 1 - 2 clamps at zero, then 5
    let confirmed: Vec<_> = andorra.iter().map(|r| r.get(Field::Confirmed)).collect();
    assert_eq!(confirmed, vec![Some(1), Some(0), Some(5)]);
    assert_eq!(andorra[2].get(Field::Deaths), Some(1));
    assert!(andorra.iter().all(|r| r.get(Field::Recovered).is_none() && r.get(Field::Active).is_none()));
    assert!(andorra.iter().all(|r| r.province.is_none() && r.region.is_none()));
}

#[test]
fn population_is_collected_per_country() {
    let table = parse_table(EXPORT.as_bytes(), b',').unwrap();
    let data = ecdc::normalize(&table, "ecdc.csv");

    assert_eq!(data.population.get(&EntityKey::country("Italy")), Some(60_431_283));
    assert_eq!(data.population.get(&EntityKey::country("Andorra")), Some(77_006));
}

#[test]
fn bad_rows_are_reported_not_fatal() {
    let table = parse_table(EXPORT.as_bytes(), b',').unwrap();
    let data = ecdc::normalize(&table, "ecdc.csv");

    assert!(
        data.issues
            .iter()
            .any(|i| matches!(i, Issue::SchemaMismatch { field: "date", row: 7, .. }))
    );
    assert!(
        data.issues
            .iter()
            .any(|i| matches!(i, Issue::ParseFailure { field: Field::Confirmed, .. }))
    );

    // the garbage row counts as zero cases and flags its record
    let italy: Vec<_> = data.records.iter().filter(|r| r.country == "Italy").collect();
    assert_eq!(italy.len(), 3);
    assert_eq!(italy.last().map(|r| r.get(Field::Confirmed)), Some(Some(801)));
    assert!(italy.iter().any(|r| r.flagged));
}

#[test]
fn output_is_sorted_by_date_then_entity() {
    let table = parse_table(EXPORT.as_bytes(), b',').unwrap();
    let data = ecdc::normalize(&table, "ecdc.csv");

    let first_day: Vec<_> = data.records.iter().take_while(|r| r.date == day(1)).map(|r| r.country.as_str()).collect();
    assert_eq!(first_day, vec!["Andorra", "Italy", "Italy"]);
}
