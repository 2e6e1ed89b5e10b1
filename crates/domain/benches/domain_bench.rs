use chrono::{Days, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Batch, OrderLine, Product};

const SKU: &str = "BENCH-CHAIR";

fn make_product(batch_count: u32, batch_size: i64) -> Product {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let batches = (0..batch_count)
        .map(|i| {
            let eta = start + Days::new(u64::from(i));
            Batch::new(format!("batch-{i:03}"), SKU, batch_size, Some(eta))
        })
        .collect();
    Product::new(SKU, batches)
}

fn bench_allocate_50_batches(c: &mut Criterion) {
    let product = make_product(50, 50);

    c.bench_function("domain/allocate_50_batches", |b| {
        b.iter(|| {
            let mut product = product.clone();
            product.allocate(OrderLine::new("order-1", SKU, 10))
        });
    });
}

fn bench_allocate_100_batches(c: &mut Criterion) {
    let product = make_product(100, 50);

    c.bench_function("domain/allocate_100_batches", |b| {
        b.iter(|| {
            let mut product = product.clone();
            product.allocate(OrderLine::new("order-1", SKU, 10))
        });
    });
}

fn bench_change_quantity_settling(c: &mut Criterion) {
    // One batch holding 50 lines; shrinking it forces 25 deallocations.
    let mut product = Product::new(SKU, vec![Batch::new("batch-001", SKU, 100, None)]);
    for i in 0..50 {
        product.allocate(OrderLine::new(format!("order-{i:03}"), SKU, 2));
    }
    let _ = product.drain_events();
    let reference = product.batches()[0].reference().clone();

    c.bench_function("domain/change_quantity_deallocates_25", |b| {
        b.iter(|| {
            let mut product = product.clone();
            product.change_batch_quantity(&reference, 50).unwrap();
        });
    });
}

fn bench_serde_roundtrip(c: &mut Criterion) {
    let mut product = make_product(100, 50);
    for i in 0..100 {
        product.allocate(OrderLine::new(format!("order-{i:03}"), SKU, 10));
    }
    let _ = product.drain_events();

    c.bench_function("domain/serde_roundtrip_100_batches", |b| {
        b.iter(|| {
            let json = serde_json::to_string(&product).unwrap();
            let restored: Product = serde_json::from_str(&json).unwrap();
            restored
        });
    });
}

criterion_group!(
    benches,
    bench_allocate_50_batches,
    bench_allocate_100_batches,
    bench_change_quantity_settling,
    bench_serde_roundtrip,
);
criterion_main!(benches);
