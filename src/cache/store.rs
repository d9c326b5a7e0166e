use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::RwLock;
use thiserror::Error;

use super::container::Container;
use super::entry::{CacheEntry, ContainerKind};
use super::value::{CacheKey, CacheValue};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("{entry} is stored in a {actual}, which does not support {attempted}")]
    InvalidCategoryUse {
        entry: CacheEntry,
        actual: ContainerKind,
        attempted: &'static str,
    },
    #[error("Attempted to store an empty key in {0}")]
    InvalidKey(CacheEntry),
}

/// Capacity overrides for bounded categories, fixed when a [`CacheStore`] is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheConfig {
    pub capacities: HashMap<CacheEntry, NonZeroUsize>,
}

/// Builds a [`CacheStore`] whose bounded categories may use capacities other than
/// the catalog defaults.
#[derive(Debug, Clone, Default)]
pub struct CacheStoreBuilder {
    capacities: HashMap<CacheEntry, NonZeroUsize>,
}

impl CacheStoreBuilder {
    /// Override the capacity of a bounded category.
    ///
    /// # Errors
    /// [`CacheError::InvalidCategoryUse`] if `entry` is not a bounded map.
    pub fn capacity(mut self, entry: CacheEntry, capacity: NonZeroUsize) -> Result<Self, CacheError> {
        let kind = entry.container_kind();
        if kind.capacity().is_none() {
            return Err(CacheError::InvalidCategoryUse {
                entry,
                actual: kind,
                attempted: "a capacity",
            });
        }
        self.capacities.insert(entry, capacity);
        Ok(self)
    }

    /// Apply every override in `config`
    pub fn config(mut self, config: &CacheConfig) -> Result<Self, CacheError> {
        for (entry, capacity) in config.capacities.iter() {
            self = self.capacity(*entry, *capacity)?;
        }
        Ok(self)
    }

    pub fn build(self) -> CacheStore {
        CacheStore {
            containers: RwLock::new(HashMap::new()),
            capacities: self.capacities,
        }
    }
}

/// A typed store with one lazily created container per [`CacheEntry`].
///
/// A store belongs to a single open file. Population writes into it once,
/// after which any number of threads may query it concurrently through `&self`.
///
/// Every read returns an owned snapshot. Heavyweight objects are held in
/// [`Arc`]s, so cloning them out is cheap, and callers never observe later
/// mutation of the store through a value they already hold.
#[derive(Debug, Default)]
pub struct CacheStore {
    containers: RwLock<HashMap<CacheEntry, Arc<Container>>>,
    capacities: HashMap<CacheEntry, NonZeroUsize>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> CacheStoreBuilder {
        CacheStoreBuilder::default()
    }

    /// The container shape `entry` is materialized with in this store
    pub fn container_kind(&self, entry: CacheEntry) -> ContainerKind {
        match (entry.container_kind(), self.capacities.get(&entry)) {
            (ContainerKind::BoundedMap(_), Some(capacity)) => ContainerKind::BoundedMap(*capacity),
            (kind, _) => kind,
        }
    }

    fn container(&self, entry: CacheEntry) -> Option<Arc<Container>> {
        self.containers.read().get(&entry).cloned()
    }

    fn container_or_create(&self, entry: CacheEntry) -> Arc<Container> {
        if let Some(container) = self.container(entry) {
            return container;
        }
        let mut containers = self.containers.write();
        containers
            .entry(entry)
            .or_insert_with(|| {
                let kind = self.container_kind(entry);
                trace!("Materializing {kind} for {entry}");
                Arc::new(Container::for_kind(kind))
            })
            .clone()
    }

    fn map_misuse(&self, entry: CacheEntry) -> CacheError {
        CacheError::InvalidCategoryUse {
            entry,
            actual: entry.container_kind(),
            attempted: "key-value insertion",
        }
    }

    fn collection_misuse(&self, entry: CacheEntry) -> CacheError {
        CacheError::InvalidCategoryUse {
            entry,
            actual: entry.container_kind(),
            attempted: "key-only insertion",
        }
    }

    /// Insert or overwrite `key → value` in a map category.
    ///
    /// # Errors
    /// - [`CacheError::InvalidCategoryUse`] if `entry` is a list or set category
    /// - [`CacheError::InvalidKey`] if `key` is empty
    pub fn put<K: Into<CacheKey>, V: Into<CacheValue>>(
        &self,
        entry: CacheEntry,
        key: K,
        value: V,
    ) -> Result<(), CacheError> {
        if !entry.container_kind().is_map() {
            return Err(self.map_misuse(entry));
        }
        let key = key.into();
        if !key.is_valid() {
            return Err(CacheError::InvalidKey(entry));
        }
        self.container_or_create(entry).insert(key, value.into());
        Ok(())
    }

    /// Add `key` as an element of a list or set category.
    ///
    /// # Errors
    /// - [`CacheError::InvalidCategoryUse`] if `entry` is a map category
    /// - [`CacheError::InvalidKey`] if `key` is empty
    pub fn put_key<K: Into<CacheKey>>(&self, entry: CacheEntry, key: K) -> Result<(), CacheError> {
        if !entry.container_kind().is_collection() {
            return Err(self.collection_misuse(entry));
        }
        let key = key.into();
        if !key.is_valid() {
            return Err(CacheError::InvalidKey(entry));
        }
        self.container_or_create(entry).push(key);
        Ok(())
    }

    /// Insert many pairs into a map category. This is additive, clear the
    /// category first to replace its contents. An empty batch does not
    /// materialize the container.
    pub fn put_all<K, V, I>(&self, entry: CacheEntry, entries: I) -> Result<(), CacheError>
    where
        K: Into<CacheKey>,
        V: Into<CacheValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        if !entry.container_kind().is_map() {
            return Err(self.map_misuse(entry));
        }
        let entries: Vec<(CacheKey, CacheValue)> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if entries.is_empty() {
            return Ok(());
        }
        if entries.iter().any(|(k, _)| !k.is_valid()) {
            return Err(CacheError::InvalidKey(entry));
        }
        self.container_or_create(entry).extend(entries);
        Ok(())
    }

    /// Add many elements to a list or set category. Additive like [`CacheStore::put_all`].
    pub fn put_all_keys<K, I>(&self, entry: CacheEntry, keys: I) -> Result<(), CacheError>
    where
        K: Into<CacheKey>,
        I: IntoIterator<Item = K>,
    {
        if !entry.container_kind().is_collection() {
            return Err(self.collection_misuse(entry));
        }
        let keys: Vec<CacheKey> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Ok(());
        }
        if keys.iter().any(|k| !k.is_valid()) {
            return Err(CacheError::InvalidKey(entry));
        }
        self.container_or_create(entry).extend_elements(keys);
        Ok(())
    }

    /// Look up `key` in a map category. Reading a bounded category marks the
    /// entry as recently used.
    pub fn get<K: Into<CacheKey>>(&self, entry: CacheEntry, key: K) -> Option<CacheValue> {
        self.container(entry)?.get(&key.into())
    }

    /// A snapshot of a list or set category, or `None` if it was never written
    /// or is a map category.
    pub fn get_collection(&self, entry: CacheEntry) -> Option<Vec<CacheKey>> {
        let container = self.container(entry)?;
        if container.is_map() {
            return None;
        }
        Some(container.keys())
    }

    /// The values for those of `keys` that are present, in the order requested.
    /// Missing keys are skipped, so the result may be shorter than `keys`.
    pub fn get_many<K, I>(&self, entry: CacheEntry, keys: I) -> Vec<CacheValue>
    where
        K: Into<CacheKey>,
        I: IntoIterator<Item = K>,
    {
        let Some(container) = self.container(entry) else {
            return Vec::new();
        };
        let keys: Vec<CacheKey> = keys.into_iter().map(Into::into).collect();
        container.get_many(keys.iter())
    }

    /// The keys of a map category or the elements of a collection category
    pub fn keys(&self, entry: CacheEntry) -> Vec<CacheKey> {
        self.container(entry)
            .map(|c| c.keys())
            .unwrap_or_default()
    }

    /// Whether a container has been materialized for `entry`, even if it is empty
    pub fn contains(&self, entry: CacheEntry) -> bool {
        self.containers.read().contains_key(&entry)
    }

    pub fn contains_key<K: Into<CacheKey>>(&self, entry: CacheEntry, key: K) -> bool {
        self.container(entry)
            .is_some_and(|c| c.contains_key(&key.into()))
    }

    pub fn len(&self, entry: CacheEntry) -> usize {
        self.container(entry).map(|c| c.len()).unwrap_or_default()
    }

    pub fn is_empty(&self, entry: CacheEntry) -> bool {
        self.len(entry) == 0
    }

    /// Drop the container for `entry`. The next write creates a fresh one.
    pub fn clear(&self, entry: CacheEntry) {
        self.containers.write().remove(&entry);
    }

    /// Drop every container
    pub fn clear_all(&self) {
        self.containers.write().clear();
    }

    /// The categories that currently have a container
    pub fn entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<_> = self.containers.read().keys().copied().collect();
        entries.sort();
        entries
    }

    /// Move every category materialized in `staging` into this store, replacing
    /// whatever this store held for those categories. Categories `staging` never
    /// touched are left alone.
    pub fn replace_from(&self, staging: CacheStore) {
        let incoming = staging.containers.into_inner();
        debug!("Committing {} staged categories", incoming.len());
        self.containers.write().extend(incoming);
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::*;
    use crate::ident::SpectrumReference;
    use crate::model::Spectrum;

    #[test]
    fn test_collection_put_rejected() {
        let store = CacheStore::new();
        let err = store
            .put(CacheEntry::SpectrumId, "s1", "value")
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidCategoryUse { entry: CacheEntry::SpectrumId, .. }));
        assert!(!store.contains(CacheEntry::SpectrumId));

        store.put_key(CacheEntry::SpectrumId, "s1").unwrap();
        assert_eq!(
            store.get_collection(CacheEntry::SpectrumId),
            Some(vec![CacheKey::from("s1")])
        );
    }

    #[test]
    fn test_map_put_key_rejected() {
        let store = CacheStore::new();
        let err = store.put_key(CacheEntry::PeptideToSpectrum, "i1").unwrap_err();
        assert!(matches!(err, CacheError::InvalidCategoryUse { .. }));
    }

    #[test]
    fn test_empty_key_rejected() {
        let store = CacheStore::new();
        assert_eq!(
            store.put(CacheEntry::PeptideSequence, "", "PEPTIDE"),
            Err(CacheError::InvalidKey(CacheEntry::PeptideSequence))
        );
        assert_eq!(
            store.put_key(CacheEntry::ProteinId, ""),
            Err(CacheError::InvalidKey(CacheEntry::ProteinId))
        );
    }

    #[test]
    fn test_lru_bound() {
        let store = CacheStore::builder()
            .capacity(CacheEntry::Spectrum, NonZeroUsize::new(3).unwrap())
            .unwrap()
            .build();
        for i in 0..5 {
            let id = format!("scan={i}");
            store
                .put(CacheEntry::Spectrum, id.clone(), Spectrum::new(id, i, 2))
                .unwrap();
        }
        assert_eq!(store.len(CacheEntry::Spectrum), 3);
        assert!(!store.contains_key(CacheEntry::Spectrum, "scan=0"));
        assert!(!store.contains_key(CacheEntry::Spectrum, "scan=1"));
        for i in 2..5 {
            assert!(store.contains_key(CacheEntry::Spectrum, format!("scan={i}")));
        }
    }

    #[test]
    fn test_lru_access_order() {
        let store = CacheStore::builder()
            .capacity(CacheEntry::Protein, NonZeroUsize::new(2).unwrap())
            .unwrap()
            .build();
        store.put(CacheEntry::Protein, "P1", crate::model::Protein::new("P1", "A")).unwrap();
        store.put(CacheEntry::Protein, "P2", crate::model::Protein::new("P2", "B")).unwrap();
        assert!(store.get(CacheEntry::Protein, "P1").is_some());
        store.put(CacheEntry::Protein, "P3", crate::model::Protein::new("P3", "C")).unwrap();

        assert!(store.contains_key(CacheEntry::Protein, "P1"));
        assert!(!store.contains_key(CacheEntry::Protein, "P2"));
        assert!(store.contains_key(CacheEntry::Protein, "P3"));
    }

    #[test]
    fn test_capacity_override_only_for_bounded() {
        let err = CacheStore::builder()
            .capacity(CacheEntry::ProteinId, NonZeroUsize::new(3).unwrap())
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidCategoryUse { .. }));

        let mut config = CacheConfig::default();
        config
            .capacities
            .insert(CacheEntry::Peptide, NonZeroUsize::new(7).unwrap());
        let store = CacheStore::builder().config(&config).unwrap().build();
        assert_eq!(
            store.container_kind(CacheEntry::Peptide),
            ContainerKind::BoundedMap(NonZeroUsize::new(7).unwrap())
        );
    }

    #[test]
    fn test_get_many_skips_missing() {
        let store = CacheStore::new();
        store
            .put(CacheEntry::PeptideSequence, "present", "PEPTIDE")
            .unwrap();
        let values = store.get_many(CacheEntry::PeptideSequence, ["present", "absent"]);
        assert_eq!(values, vec![CacheValue::from("PEPTIDE")]);
        assert!(store
            .get_many(CacheEntry::PeptideStart, ["present"])
            .is_empty());
    }

    #[test]
    fn test_clear_removes_container() {
        let store = CacheStore::new();
        assert!(!store.contains(CacheEntry::ProteinId));
        store.put_all_keys(CacheEntry::ProteinId, ["P1", "P2"]).unwrap();
        assert!(store.contains(CacheEntry::ProteinId));
        store.clear(CacheEntry::ProteinId);
        assert!(!store.contains(CacheEntry::ProteinId));
        assert_eq!(store.get_collection(CacheEntry::ProteinId), None);

        store.put_all_keys(CacheEntry::ProteinId, Vec::<String>::new()).unwrap();
        assert!(!store.contains(CacheEntry::ProteinId));

        store.put_key(CacheEntry::ProteinId, "P3").unwrap();
        store.put(CacheEntry::PeptideSequence, "x", "PEP").unwrap();
        store.clear_all();
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_snapshot_is_isolated() {
        let store = CacheStore::new();
        store.put_key(CacheEntry::ProteinId, "P1").unwrap();
        let snapshot = store.get_collection(CacheEntry::ProteinId).unwrap();
        store.put_key(CacheEntry::ProteinId, "P2").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(CacheEntry::ProteinId), 2);
    }

    #[test]
    fn test_replace_from() {
        let store = CacheStore::new();
        store.put_all_keys(CacheEntry::ProteinId, ["old"]).unwrap();
        store.put_all_keys(CacheEntry::SpectrumId, ["s1"]).unwrap();

        let staging = CacheStore::new();
        staging.put_all_keys(CacheEntry::ProteinId, ["new"]).unwrap();
        store.replace_from(staging);

        assert_eq!(
            store.get_collection(CacheEntry::ProteinId),
            Some(vec![CacheKey::from("new")])
        );
        assert_eq!(store.len(CacheEntry::SpectrumId), 1);
    }

    #[test]
    fn test_concurrent_readers() {
        let store = CacheStore::builder()
            .capacity(CacheEntry::Spectrum, NonZeroUsize::new(16).unwrap())
            .unwrap()
            .build();
        for i in 0..64u64 {
            store
                .put(
                    CacheEntry::PeptideToSpectrum,
                    format!("item_{i}"),
                    SpectrumReference::new((i + 1).to_string(), "SD_1"),
                )
                .unwrap();
        }

        thread::scope(|scope| {
            for t in 0..4usize {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..64usize {
                        let id = format!("scan={}", (i + t) % 32);
                        store
                            .put(CacheEntry::Spectrum, id.clone(), Spectrum::new(id.clone(), i, 2))
                            .unwrap();
                        store.get(CacheEntry::Spectrum, id);
                        let found = store
                            .get(CacheEntry::PeptideToSpectrum, format!("item_{i}"))
                            .and_then(CacheValue::into_spectrum_reference);
                        assert!(found.is_some());
                    }
                });
            }
        });
        assert!(store.len(CacheEntry::Spectrum) <= 16);
        assert_eq!(store.len(CacheEntry::PeptideToSpectrum), 64);
    }
}
