//! Wire grammar encoding/decoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use soia_wire::{skip_value, wire, Reader, Writer};

fn bench_uint_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("uint_encode");

    for value in [7u64, 1_000, 1_000_000, u64::MAX] {
        group.bench_with_input(BenchmarkId::from_parameter(value), &value, |b, &value| {
            b.iter(|| {
                let mut w = Writer::new();
                wire::encode_uint(&mut w, black_box(value));
                black_box(w.len())
            });
        });
    }

    group.finish();
}

fn bench_i32_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("i32_decode");

    for value in [100i32, -257, 70_000, i32::MIN] {
        let mut w = Writer::new();
        wire::encode_i32(&mut w, value);
        let encoded = w.freeze();

        group.bench_with_input(BenchmarkId::from_parameter(value), &encoded, |b, encoded| {
            b.iter(|| {
                let mut r = Reader::new(encoded);
                black_box(wire::decode_i32(&mut r).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_string_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_roundtrip");

    for size in [16usize, 1_000, 100_000] {
        let value = "x".repeat(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &value, |b, value| {
            b.iter(|| {
                let mut w = Writer::new();
                wire::encode_string(&mut w, black_box(value));
                let encoded = w.freeze();
                let mut r = Reader::new(&encoded);
                black_box(wire::decode_string(&mut r).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_skip_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("skip_nested");

    for len in [10usize, 100, 1_000] {
        let mut w = Writer::new();
        wire::encode_array_len(&mut w, len);
        for i in 0..len {
            wire::encode_array_len(&mut w, 2);
            wire::encode_i64(&mut w, i as i64);
            wire::encode_string(&mut w, "payload");
        }
        let encoded = w.freeze();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &encoded, |b, encoded| {
            b.iter(|| {
                let mut r = Reader::new(encoded);
                skip_value(&mut r).unwrap();
                black_box(r.position())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_uint_encode,
    bench_i32_decode,
    bench_string_roundtrip,
    bench_skip_nested,
);

criterion_main!(benches);
