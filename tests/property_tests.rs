// Property Tests for sortedkv
// Random operation sequences checked against a BTreeMap model

use proptest::prelude::*;
use sortedkv::sstable::{flush_store, Table};
use sortedkv::{open_store, Entry, KvIterator, Options, Store, StoreKind};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Op {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// Short keys over a small alphabet so puts, overwrites and deletes collide
fn key() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(vec![0u8, b'a', b'b', b'c', 0xff]), 0..4)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (key(), prop::collection::vec(any::<u8>(), 0..16)).prop_map(|(k, v)| Op::Put(k, v)),
        1 => key().prop_map(Op::Delete),
    ]
}

fn apply(store: &mut dyn Store, model: &mut BTreeMap<Vec<u8>, Vec<u8>>, ops: &[Op]) {
    for op in ops {
        match op {
            Op::Put(k, v) => {
                store.put(k, v);
                model.insert(k.clone(), v.clone());
            }
            Op::Delete(k) => {
                let result = store.delete(k);
                match model.remove(k) {
                    Some(_) => assert!(result.is_ok()),
                    None => assert!(result.unwrap_err().is_not_found()),
                }
            }
        }
    }
}

fn model_range(model: &BTreeMap<Vec<u8>, Vec<u8>>, start: &[u8], limit: &[u8]) -> Vec<Entry> {
    model
        .iter()
        .filter(|(k, _)| k.as_slice() >= start && (limit.is_empty() || k.as_slice() < limit))
        .map(|(k, v)| Entry::new(k, v))
        .collect()
}

proptest! {
    #[test]
    fn prop_stores_match_model(ops in prop::collection::vec(op(), 0..200), seed in any::<u64>()) {
        for kind in StoreKind::ALL {
            let mut store = open_store(kind, &Options::default().seed(seed)).unwrap();
            let mut model = BTreeMap::new();
            apply(&mut *store, &mut model, &ops);

            prop_assert_eq!(store.len(), model.len());
            let entries = store.scan_all().unwrap().collect_entries().unwrap();
            prop_assert_eq!(entries, model_range(&model, b"", b""));

            for (k, v) in &model {
                prop_assert_eq!(store.get(k).unwrap(), v.as_slice());
            }
        }
    }

    #[test]
    fn prop_store_range_scan(ops in prop::collection::vec(op(), 0..100), a in key(), b in key()) {
        let (start, limit) = if a <= b { (a, b) } else { (b, a) };
        for kind in StoreKind::ALL {
            let mut store = open_store(kind, &Options::default().seed(7)).unwrap();
            let mut model = BTreeMap::new();
            apply(&mut *store, &mut model, &ops);

            let entries = store.range_scan(&start, &limit).unwrap().collect_entries().unwrap();
            prop_assert_eq!(entries, model_range(&model, &start, &limit));
        }
    }

    #[test]
    fn prop_table_matches_model(
        ops in prop::collection::vec(op(), 0..200),
        block_size in 1usize..256,
        a in key(),
        b in key(),
    ) {
        let mut store = open_store(StoreKind::SkipList, &Options::default().seed(5)).unwrap();
        let mut model = BTreeMap::new();
        apply(&mut *store, &mut model, &ops);

        let mut out: Vec<u8> = Vec::new();
        let options = Options::default().block_size(block_size);
        let summary = flush_store(&*store, &mut out, &options).unwrap();
        prop_assert_eq!(summary.num_entries as usize, model.len());

        let table = Table::open(out).unwrap();
        for (k, v) in &model {
            prop_assert_eq!(&table.get(k).unwrap(), v);
        }
        prop_assert!(table.get(b"missing").unwrap_err().is_not_found());

        let (start, limit) = if a <= b { (a, b) } else { (b, a) };
        let entries = table.range_scan(&start, &limit).unwrap().collect_entries().unwrap();
        prop_assert_eq!(entries, model_range(&model, &start, &limit));

        let all = table.iter().unwrap().collect_entries().unwrap();
        prop_assert_eq!(all, model_range(&model, b"", b""));
    }
}
