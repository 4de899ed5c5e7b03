use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use storefront_catalog::{
    FacetIndex, FacetKey, FilterSelection, Product, SpecEntry, SpecValue, ValueRange, evaluate,
};
use storefront_core::ProductId;

const CATEGORIES: &[&str] = &["Pumps", "Hoses", "Fittings", "Filters", "Valves"];
const MATERIALS: &[&str] = &["steel", "brass", "plastic", "cast iron"];

fn synthetic_catalog(size: usize) -> Vec<Product> {
    (0..size)
        .map(|i| {
            let category = CATEGORIES[i % CATEGORIES.len()];
            let material = MATERIALS[i % MATERIALS.len()];
            Product::new(
                ProductId::new(),
                format!("SKU-{i:06}"),
                format!("{category} model {i}"),
                category,
            )
            .unwrap()
            .with_keywords([category.to_lowercase(), format!("series-{}", i % 7)])
            .with_spec(
                SpecEntry::new("power", SpecValue::number(((i % 40) as u64 + 1) * 50))
                    .unwrap()
                    .with_unit("W"),
            )
            .with_spec(SpecEntry::new("material", SpecValue::text(material)).unwrap())
        })
        .collect()
}

fn bench_facet_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("facet_index_build");

    for size in [100, 1000, 10000].iter() {
        let products = synthetic_catalog(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("build", size), &products, |b, products| {
            b.iter(|| black_box(FacetIndex::build(black_box(products))));
        });
    }

    group.finish();
}

fn bench_filter_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_evaluation");

    let mut category_only = FilterSelection::new();
    category_only.select(FacetKey::Category, "Pumps");

    let mut narrow = FilterSelection::new();
    narrow.select(FacetKey::Category, "Pumps");
    narrow.select(FacetKey::spec("material"), "steel");
    narrow.set_range(
        FacetKey::spec("power"),
        ValueRange::between(500, 1500).unwrap(),
    );

    let selections = [
        ("unfiltered", FilterSelection::new()),
        ("category_only", category_only),
        ("category_material_and_range", narrow),
    ];

    for size in [100, 1000, 10000].iter() {
        let products = synthetic_catalog(*size);
        group.throughput(Throughput::Elements(*size as u64));
        for (label, selection) in &selections {
            group.bench_with_input(
                BenchmarkId::new(*label, size),
                &(&products, selection),
                |b, (products, selection)| {
                    b.iter(|| black_box(evaluate(black_box(products), black_box(selection))));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_facet_index_build, bench_filter_evaluation);
criterion_main!(benches);
