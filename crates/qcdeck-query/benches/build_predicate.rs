use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qcdeck_query::{ColumnMap, TableQueryBuilder, TimeRangeSelector, TimeSelection};
use serde_json::{json, Map, Value};

fn column_map() -> ColumnMap {
    ColumnMap {
        x: "ts".to_string(),
        y: "value".to_string(),
        group_by: Some("subject_id".to_string()),
        filter_column: Some("status".to_string()),
        filter_values: vec!["Pass".to_string(), "Fail".to_string()],
    }
}

fn sample_rows(count: usize) -> Vec<Map<String, Value>> {
    (0..count)
        .map(|i| {
            let row = json!({
                "ts": 1_700_000_000 + (i as i64) * 60,
                "value": (i as f64) * 0.25,
                "subject_id": format!("{}", 600_000 + (i % 40)),
                "status": if i % 3 == 0 { "Fail" } else { "Pass" },
            });
            row.as_object().expect("object").clone()
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let map = column_map();
    let selection = TimeSelection::from_bounds(1_700_000_000_000.0, 1_700_003_600_000.0);
    c.bench_function("predicate_build", |b| {
        b.iter(|| black_box(TableQueryBuilder::build(black_box(&map), black_box(&selection))))
    });
}

fn bench_matches(c: &mut Criterion) {
    let selection = TimeSelection::from_bounds(1_700_000_000_000.0, 1_700_003_600_000.0);
    let predicate = TableQueryBuilder::build(&column_map(), &selection).expect("build");
    let rows = sample_rows(10_000);
    c.bench_function("predicate_matches_10k", |b| {
        b.iter(|| {
            let hits = rows.iter().filter(|row| predicate.matches(row)).count();
            black_box(hits)
        })
    });
}

fn bench_brush(c: &mut Criterion) {
    use qcdeck_query::BrushBounds;
    c.bench_function("selector_on_brush", |b| {
        let mut selector = TimeRangeSelector::default();
        b.iter(|| {
            let update = selector.on_brush(Some(BrushBounds {
                x0: Some(1_700_000_000_000.0),
                y0: None,
                x1: Some(1_700_003_600_000.0),
                y1: None,
            }));
            black_box(update)
        })
    });
}

criterion_group!(benches, bench_build, bench_matches, bench_brush);
criterion_main!(benches);
