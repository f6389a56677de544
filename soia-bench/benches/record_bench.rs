//! Record serializer benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use soia::{JsonFlavor, Record};
use soia_bench::{init, sample_item, Item};

fn bench_to_bytes(c: &mut Criterion) {
    init();
    let serializer = Item::serializer();
    let mut group = c.benchmark_group("record_to_bytes");

    for size in [100usize, 1_000, 10_000] {
        let item = sample_item(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &item, |b, item| {
            b.iter(|| black_box(serializer.to_bytes(item)));
        });
    }

    group.finish();
}

fn bench_from_bytes(c: &mut Criterion) {
    init();
    let serializer = Item::serializer();
    let mut group = c.benchmark_group("record_from_bytes");

    for size in [100usize, 1_000, 10_000] {
        let encoded = serializer.to_bytes(&sample_item(size));
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| black_box(serializer.from_bytes(encoded).unwrap()));
        });
    }

    group.finish();
}

fn bench_json_flavors(c: &mut Criterion) {
    init();
    let serializer = Item::serializer();
    let item = sample_item(1_000);
    let mut group = c.benchmark_group("record_json");

    for (label, flavor) in [("dense", JsonFlavor::Dense), ("readable", JsonFlavor::Readable)] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &flavor, |b, &flavor| {
            b.iter(|| black_box(serializer.to_json_code(&item, flavor)));
        });
    }

    let dense = serializer.to_json(&item, JsonFlavor::Dense);
    group.bench_function("from_dense", |b| {
        b.iter(|| black_box(serializer.from_json(&dense).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_to_bytes, bench_from_bytes, bench_json_flavors);

criterion_main!(benches);
