// Table performance benchmarks for sortedkv

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use sortedkv::sstable::{flush_store, Table};
use sortedkv::{KvIterator, Options, SkipListStore, Store};
use std::hint::black_box;
use tempfile::TempDir;

fn populated_store(size: usize) -> SkipListStore {
    let mut store = SkipListStore::with_seed(7);
    for i in 0..size {
        let key = format!("key{:08}", i);
        let value = format!("value{:08}", i);
        store.put(key.as_bytes(), value.as_bytes());
    }
    store
}

fn table_bytes(store: &SkipListStore, block_size: usize) -> Bytes {
    let mut out: Vec<u8> = Vec::new();
    flush_store(store, &mut out, &Options::default().block_size(block_size)).unwrap();
    Bytes::from(out)
}

fn benchmark_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_flush");

    for size in [1000, 10000].iter() {
        let store = populated_store(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &store, |b, store| {
            b.iter(|| {
                let mut out: Vec<u8> = Vec::new();
                black_box(flush_store(store, &mut out, &Options::default()).unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_random_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_random_get");
    let size = 10000;
    let store = populated_store(size);

    for block_size in [1024, 4096, 16384].iter() {
        let table = Table::open(table_bytes(&store, *block_size)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(block_size), &table, |b, table| {
            let mut rng = rand::rng();
            b.iter(|| {
                let key = format!("key{:08}", rng.random_range(0..size));
                black_box(table.get(key.as_bytes()).unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_file_get(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bench.sst");
    let size = 10000;

    let store = populated_store(size);
    let file = std::fs::File::create(&path).unwrap();
    flush_store(&store, file, &Options::default()).unwrap();
    let table = Table::open_path(&path).unwrap();

    c.bench_function("table_file_get", |b| {
        let mut rng = rand::rng();
        b.iter(|| {
            let key = format!("key{:08}", rng.random_range(0..size));
            black_box(table.get(key.as_bytes()).unwrap());
        });
    });
}

fn benchmark_range_scan(c: &mut Criterion) {
    let store = populated_store(10000);
    let table = Table::open(table_bytes(&store, 4096)).unwrap();

    c.bench_function("table_range_scan_1000", |b| {
        b.iter(|| {
            let mut iter = table.range_scan(b"key00004000", b"key00005000").unwrap();
            let mut count = 0;
            while iter.advance() {
                black_box(iter.value());
                count += 1;
            }
            assert_eq!(count, 1000);
        });
    });
}

criterion_group!(
    benches,
    benchmark_flush,
    benchmark_random_get,
    benchmark_file_get,
    benchmark_range_scan
);
criterion_main!(benches);
