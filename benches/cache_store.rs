use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mzcache::io::MemorySource;
use mzcache::meta::SpectraData;
use mzcache::model::Spectrum;
use mzcache::params::Param;
use mzcache::prelude::*;

fn identification_source(n: usize) -> MemorySource {
    let mut source = MemorySource::new();
    source.add_spectra_data(SpectraData::new("SD_1", "run.mgf").with_id_format(Param::from_curie(
        "MS:1000774",
        "multiple peak list nativeID format",
    )));
    for i in 0..n {
        let protein = format!("DBSeq_{}", i % 50);
        let evidence = format!("PE_{i}");
        let result = format!("SIR_{i}");
        let item = format!("SII_{i}");
        source
            .add_db_sequence(&protein, &protein)
            .add_peptide_evidence(&evidence, &protein)
            .add_result(&result, "SD_1", &format!("index={i}"))
            .add_item(&result, &item, &[evidence.as_str()]);
    }
    source
}

fn bounded_churn(store: &CacheStore, n: usize) {
    for i in 0..n {
        let id = format!("scan={i}");
        store
            .put(CacheEntry::Spectrum, id.as_str(), Spectrum::new(id.as_str(), i, 2))
            .unwrap();
        store.get(CacheEntry::Spectrum, format!("scan={}", i / 2));
    }
}

fn store_operations(c: &mut Criterion) {
    c.bench_function("bounded_put_get", |b| {
        b.iter(|| bounded_churn(&CacheStore::new(), black_box(1000)))
    });

    let store = CacheStore::new();
    store
        .put_all_keys(CacheEntry::SpectrumId, (0..10_000).map(|i| format!("scan={i}")))
        .unwrap();
    c.bench_function("collection_snapshot", |b| {
        b.iter(|| black_box(store.get_collection(CacheEntry::SpectrumId)))
    });
}

fn mzidentml_population(c: &mut Criterion) {
    let source = identification_source(2000);
    c.bench_function("mzidentml_populate", |b| {
        b.iter(|| {
            let store = CacheStore::new();
            MzIdentMLCachingStrategy.populate(black_box(&source), &store).unwrap();
            store
        })
    });
}

criterion_group!(benches, store_operations, mzidentml_population);
criterion_main!(benches);
