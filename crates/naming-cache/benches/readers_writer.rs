//! Benchmarks for the double-buffered readers/writer container.

use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use naming_cache::ReadersWriterCache;

fn bench_reader(c: &mut Criterion) {
    let cache: ReadersWriterCache<HashSet<i32>> = ReadersWriterCache::new();
    {
        let mut staging = cache.writer();
        staging.extend(0..64);
    }
    cache.swap();

    c.bench_function("readers_writer/reader", |b| {
        b.iter(|| black_box(cache.reader().contains(&31)))
    });
}

fn bench_write_swap(c: &mut Criterion) {
    let cache: ReadersWriterCache<HashSet<i32>> = ReadersWriterCache::new();

    c.bench_function("readers_writer/write_swap", |b| {
        b.iter(|| {
            {
                let mut staging = cache.writer();
                staging.clear();
                staging.extend(0..64);
            }
            cache.swap();
        })
    });
}

criterion_group!(benches, bench_reader, bench_write_swap);
criterion_main!(benches);
