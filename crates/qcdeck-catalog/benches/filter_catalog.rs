use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qcdeck_catalog::{AssetCatalog, CatalogField, CatalogFilter, LineageGroups};
use serde_json::{json, Value};

fn sample_documents(count: usize) -> Vec<Value> {
    let modalities = ["ecephys", "behavior", "ophys"];
    (0..count)
        .map(|i| {
            let modality = modalities[i % modalities.len()];
            let subject = 600_000 + (i % 50);
            let day = (i % 28) + 1;
            json!({
                "_id": format!("doc-{i}"),
                "name": format!("{modality}_{subject}_2024-06-{day:02}_10-33-39"),
                "quality_control": {"overall_status": "Pass"}
            })
        })
        .collect()
}

fn bench_load(c: &mut Criterion) {
    let documents = sample_documents(5_000);
    c.bench_function("catalog_load_5k", |b| {
        b.iter(|| black_box(AssetCatalog::from_documents(black_box(&documents))))
    });
}

fn bench_filter(c: &mut Criterion) {
    let catalog = AssetCatalog::from_documents(&sample_documents(5_000));
    let filter = CatalogFilter {
        modality: "ecephys".to_string(),
        text: "2024-06".to_string(),
        ..CatalogFilter::default()
    };
    c.bench_function("catalog_filter_5k", |b| {
        b.iter(|| black_box(catalog.filter(black_box(&filter))))
    });
    c.bench_function("catalog_distinct_5k", |b| {
        b.iter(|| black_box(catalog.distinct(CatalogField::SubjectId)))
    });
}

fn bench_group(c: &mut Criterion) {
    let catalog = AssetCatalog::from_documents(&sample_documents(5_000));
    c.bench_function("lineage_group_5k", |b| {
        b.iter(|| black_box(LineageGroups::group_records(black_box(catalog.records()))))
    });
}

criterion_group!(benches, bench_load, bench_filter, bench_group);
criterion_main!(benches);
