// Concurrent Access Tests for sortedkv
// These tests share stores across threads through SharedStore

use sortedkv::sstable::{flush_store, Table};
use sortedkv::{KvIterator, Options, SharedStore, SkipListStore, Store};
use std::sync::{Arc, Barrier};
use std::thread;

/// Test concurrent writes from multiple threads
#[test]
fn test_concurrent_writes() {
    let store = Arc::new(SharedStore::new(SkipListStore::with_seed(1)));

    let num_threads = 8;
    let writes_per_thread = 250;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..writes_per_thread {
                    let key = format!("thread_{}_key_{:04}", thread_id, i);
                    store.put(key.as_bytes(), key.as_bytes());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), num_threads * writes_per_thread);
    for thread_id in 0..num_threads {
        let key = format!("thread_{}_key_{:04}", thread_id, writes_per_thread - 1);
        assert_eq!(store.get(key.as_bytes()).unwrap(), key.as_bytes());
    }

    // Scans stay sorted after interleaved inserts
    let entries = store.range_scan(b"", b"").unwrap().collect_entries().unwrap();
    assert!(entries.windows(2).all(|pair| pair[0].key < pair[1].key));
}

/// Readers scanning while writers insert and delete
#[test]
fn test_concurrent_reads_and_writes() {
    let store = Arc::new(SharedStore::new(SkipListStore::with_seed(2)));
    for i in 0..100 {
        store.put(format!("stable_{:03}", i).as_bytes(), b"fixed");
    }

    let barrier = Arc::new(Barrier::new(4));
    let mut handles = Vec::new();

    for writer in 0..2 {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..500 {
                let key = format!("churn_{}_{:03}", writer, i % 50);
                store.put(key.as_bytes(), b"x");
                if i % 3 == 0 {
                    let _ = store.delete(key.as_bytes());
                }
            }
        }));
    }

    for _ in 0..2 {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..100 {
                let mut iter = store.range_scan(b"stable_", b"stable`").unwrap();
                let mut count = 0;
                while iter.advance() {
                    assert_eq!(iter.value(), b"fixed");
                    count += 1;
                }
                assert_eq!(count, 100);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

/// A shared store can be flushed under its read lock
#[test]
fn test_flush_shared_store() {
    let store = SharedStore::new(SkipListStore::with_seed(3));
    store.put(b"a", b"alpha");
    store.put(b"c", b"charlie");

    let mut out: Vec<u8> = Vec::new();
    let summary = store.with_read(|s| flush_store(s, &mut out, &Options::default())).unwrap();
    assert_eq!(summary.num_entries, 2);

    let table = Table::open(out).unwrap();
    assert_eq!(table.get(b"a").unwrap(), b"alpha");

    let inner = store.into_inner();
    assert_eq!(inner.len(), 2);
}
