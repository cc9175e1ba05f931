// benches/extract.rs
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use chrono::NaiveDate;

use covid_munge::extract::{ExtractTarget, TableVocabulary, extract_with, table};

const COUNTIES: usize = 130;

/// Saved revision if present, otherwise a synthetic page of similar shape.
fn load_sample() -> (String, Vec<String>) {
    let names: Vec<String> = (0..COUNTIES).map(|i| format!("County{i:03}")).collect();
    if let Ok(doc) = std::fs::read_to_string(".ignore/page_samples/virginia.html") {
        return (doc, names);
    }

    let mut doc = String::from("<html><body>");
    for i in 0..20 {
        doc.push_str(&format!("<table class=\"infobox\"><tr><th>Item {i}</th><td>{i}</td></tr></table>"));
    }
    doc.push_str("<table class=\"wikitable sortable\"><tr><th>County</th><th>Cases</th><th>Deaths</th><th>Recovered</th></tr>");
    for (i, n) in names.iter().enumerate() {
        doc.push_str(&format!(
            "<tr><th>{n}<sup>[{i}]</sup></th><td>{},{:03}</td><td>{}</td><td>{}</td></tr>",
            i + 1,
            i,
            i / 10,
            i / 3
        ));
    }
    doc.push_str("<tr><td>Total</td><td>9,999</td><td>99</td><td>9</td></tr></table></body></html>");
    (doc, names)
}

fn bench_extract(c: &mut Criterion) {
    let (doc, names) = load_sample();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let vocab = TableVocabulary::default();
    let target = ExtractTarget {
        country: "US".into(),
        province: "Virginia".into(),
        date: NaiveDate::from_ymd_opt(2020, 4, 1).expect("valid date"),
    };

    c.bench_function("tables", |b| {
        b.iter(|| black_box(table::tables(black_box(&doc))).len())
    });

    c.bench_function("extract", |b| {
        b.iter(|| {
            let out = extract_with(black_box(&doc), "bench", &target, &names, &vocab);
            black_box(out.records.len())
        })
    });
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
