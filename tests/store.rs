use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use mzcache::cache::{CacheConfig, CacheError, ContainerKind};
use mzcache::model::Spectrum;
use mzcache::prelude::*;

#[test_log::test]
fn test_collection_and_map_misuse() {
    let store = CacheStore::new();
    assert!(matches!(
        store.put(CacheEntry::SpectrumId, "s1", "value"),
        Err(CacheError::InvalidCategoryUse { .. })
    ));
    store.put_key(CacheEntry::SpectrumId, "s1").unwrap();
    assert!(matches!(
        store.put_key(CacheEntry::SpectrumLevel, "s1"),
        Err(CacheError::InvalidCategoryUse { .. })
    ));
    assert!(matches!(
        store.put(CacheEntry::SpectrumLevel, "", 2i64),
        Err(CacheError::InvalidKey(CacheEntry::SpectrumLevel))
    ));
}

#[test_log::test]
fn test_lru_bound() {
    let store = CacheStore::builder()
        .capacity(CacheEntry::Spectrum, NonZeroUsize::new(5).unwrap())
        .unwrap()
        .build();
    for i in 0..8 {
        let id = format!("scan={i}");
        store
            .put(CacheEntry::Spectrum, id.as_str(), Spectrum::new(id.as_str(), i, 1))
            .unwrap();
    }
    assert_eq!(store.len(CacheEntry::Spectrum), 5);
    for i in 0..3 {
        assert!(store.get(CacheEntry::Spectrum, format!("scan={i}")).is_none());
    }
    for i in 3..8 {
        assert!(store.get(CacheEntry::Spectrum, format!("scan={i}")).is_some());
    }
}

#[test_log::test]
fn test_default_capacities() {
    let store = CacheStore::new();
    assert_eq!(
        store.container_kind(CacheEntry::Spectrum),
        ContainerKind::BoundedMap(NonZeroUsize::new(200).unwrap())
    );
    assert_eq!(
        store.container_kind(CacheEntry::Peptide),
        ContainerKind::BoundedMap(NonZeroUsize::new(500).unwrap())
    );
    assert_eq!(store.container_kind(CacheEntry::ProteinId), ContainerKind::List);
}

#[test_log::test]
fn test_config_rejects_unbounded_override() {
    let mut config = CacheConfig::default();
    config
        .capacities
        .insert(CacheEntry::ProteinId, NonZeroUsize::new(3).unwrap());
    assert!(matches!(
        CacheStore::builder().config(&config),
        Err(CacheError::InvalidCategoryUse { .. })
    ));
}

#[test_log::test]
fn test_get_many_skips_missing() {
    let store = CacheStore::new();
    store.put(CacheEntry::PeptideSequence, "pep_1", "PEPTIDE").unwrap();
    let values = store.get_many(CacheEntry::PeptideSequence, ["pep_1", "pep_2"]);
    assert_eq!(values, vec![CacheValue::from("PEPTIDE")]);
    assert!(store.get_many(CacheEntry::PeptideEnd, ["pep_1"]).is_empty());
}

#[test_log::test]
fn test_clear_removes_container() {
    let store = CacheStore::new();
    store.put_key(CacheEntry::ProteinId, "P1").unwrap();
    assert!(store.contains(CacheEntry::ProteinId));
    store.clear(CacheEntry::ProteinId);
    assert!(!store.contains(CacheEntry::ProteinId));
    assert_eq!(store.get_collection(CacheEntry::ProteinId), None);
    store.put_key(CacheEntry::ProteinId, "P2").unwrap();
    store.clear_all();
    assert!(store.entries().is_empty());
}

#[test_log::test]
fn test_concurrent_readers() {
    let store = Arc::new(CacheStore::new());
    store
        .put_all_keys(CacheEntry::SpectrumId, (0..100).map(|i| format!("scan={i}")))
        .unwrap();
    for i in 0..50 {
        let id = format!("scan={i}");
        store
            .put(CacheEntry::Spectrum, id.as_str(), Spectrum::new(id.as_str(), i, 1))
            .unwrap();
    }
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut found = 0;
                for i in 0..50 {
                    if store
                        .get(CacheEntry::Spectrum, format!("scan={}", (i + t) % 50))
                        .is_some()
                    {
                        found += 1;
                    }
                }
                assert_eq!(store.len(CacheEntry::SpectrumId), 100);
                found
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 50);
    }
}
