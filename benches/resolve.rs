//! Benchmarks for frame label resolution
//!
//! Run with: cargo bench --bench resolve

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use darkflat::{resolve, segment, FrameLabel, ImageKey, SliceSpec};
use std::hint::black_box;

/// Blocks of `block` data frames separated by 20 flats, with 20 darks
/// at the start
fn generate_key(blocks: usize, block: usize) -> ImageKey {
    let mut labels = vec![FrameLabel::Dark; 20];
    for _ in 0..blocks {
        labels.extend(std::iter::repeat(FrameLabel::Flat).take(20));
        labels.extend(std::iter::repeat(FrameLabel::Data).take(block));
    }
    labels.extend(std::iter::repeat(FrameLabel::Flat).take(20));
    ImageKey::new(labels)
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for &blocks in &[4usize, 16, 64] {
        let key = generate_key(blocks, 1800);
        let data_frames = key.count(FrameLabel::Data);
        let window = SliceSpec::range(data_frames / 4, data_frames / 2);
        group.throughput(Throughput::Elements(key.len() as u64));

        group.bench_with_input(BenchmarkId::new("flat_full", blocks), &key, |b, key| {
            b.iter(|| resolve(black_box(key), FrameLabel::Flat, None))
        });

        group.bench_with_input(BenchmarkId::new("flat_windowed", blocks), &key, |b, key| {
            b.iter(|| resolve(black_box(key), FrameLabel::Flat, Some(&window)))
        });
    }

    group.finish();
}

fn bench_segment(c: &mut Criterion) {
    let key = generate_key(64, 1800);
    let flats = key.positions(FrameLabel::Flat);

    c.bench_function("segment_flats", |b| b.iter(|| segment(black_box(&flats))));
}

criterion_group!(benches, bench_resolve, bench_segment);
criterion_main!(benches);
