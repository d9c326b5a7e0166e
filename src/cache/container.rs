use std::collections::HashMap;

use indexmap::IndexSet;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};

use super::entry::ContainerKind;
use super::value::{CacheKey, CacheValue};

/// The backing storage of one category.
///
/// The variant is chosen from the category's [`ContainerKind`] when the container
/// is first materialized and never changes afterwards. Every variant locks
/// internally so a container can be shared between reader threads. A bounded map
/// records recency on every read, so reads take the same exclusive lock as writes.
#[derive(Debug)]
pub(crate) enum Container {
    Bounded(Mutex<LruCache<CacheKey, CacheValue>>),
    Unbounded(RwLock<HashMap<CacheKey, CacheValue>>),
    List(RwLock<Vec<CacheKey>>),
    Set(RwLock<IndexSet<CacheKey>>),
}

impl Container {
    pub(crate) fn for_kind(kind: ContainerKind) -> Self {
        match kind {
            ContainerKind::BoundedMap(capacity) => Self::Bounded(Mutex::new(LruCache::new(capacity))),
            ContainerKind::UnboundedMap => Self::Unbounded(RwLock::new(HashMap::new())),
            ContainerKind::List => Self::List(RwLock::new(Vec::new())),
            ContainerKind::Set => Self::Set(RwLock::new(IndexSet::new())),
        }
    }

    pub(crate) fn is_map(&self) -> bool {
        matches!(self, Self::Bounded(_) | Self::Unbounded(_))
    }

    /// Insert into a map container, returning `false` if this is a collection
    pub(crate) fn insert(&self, key: CacheKey, value: CacheValue) -> bool {
        match self {
            Self::Bounded(map) => {
                map.lock().put(key, value);
            }
            Self::Unbounded(map) => {
                map.write().insert(key, value);
            }
            Self::List(_) | Self::Set(_) => return false,
        }
        true
    }

    pub(crate) fn extend<I: IntoIterator<Item = (CacheKey, CacheValue)>>(&self, entries: I) -> bool {
        match self {
            Self::Bounded(map) => {
                let mut map = map.lock();
                for (k, v) in entries {
                    map.put(k, v);
                }
            }
            Self::Unbounded(map) => {
                map.write().extend(entries);
            }
            Self::List(_) | Self::Set(_) => return false,
        }
        true
    }

    /// Add an element to a collection container, returning `false` if this is a map
    pub(crate) fn push(&self, element: CacheKey) -> bool {
        match self {
            Self::List(list) => list.write().push(element),
            Self::Set(set) => {
                set.write().insert(element);
            }
            Self::Bounded(_) | Self::Unbounded(_) => return false,
        }
        true
    }

    pub(crate) fn extend_elements<I: IntoIterator<Item = CacheKey>>(&self, elements: I) -> bool {
        match self {
            Self::List(list) => list.write().extend(elements),
            Self::Set(set) => set.write().extend(elements),
            Self::Bounded(_) | Self::Unbounded(_) => return false,
        }
        true
    }

    /// Look up a key. For a bounded map this marks the entry as most recently used.
    pub(crate) fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        match self {
            Self::Bounded(map) => map.lock().get(key).cloned(),
            Self::Unbounded(map) => map.read().get(key).cloned(),
            Self::List(_) | Self::Set(_) => None,
        }
    }

    /// Look up several keys while holding the lock once, skipping missing keys
    pub(crate) fn get_many<'a, I: IntoIterator<Item = &'a CacheKey>>(&self, keys: I) -> Vec<CacheValue> {
        match self {
            Self::Bounded(map) => {
                let mut map = map.lock();
                keys.into_iter().filter_map(|k| map.get(k).cloned()).collect()
            }
            Self::Unbounded(map) => {
                let map = map.read();
                keys.into_iter().filter_map(|k| map.get(k).cloned()).collect()
            }
            Self::List(_) | Self::Set(_) => Vec::new(),
        }
    }

    /// Membership test. Does not touch recency.
    pub(crate) fn contains_key(&self, key: &CacheKey) -> bool {
        match self {
            Self::Bounded(map) => map.lock().contains(key),
            Self::Unbounded(map) => map.read().contains_key(key),
            Self::List(list) => list.read().contains(key),
            Self::Set(set) => set.read().contains(key),
        }
    }

    /// The keys of a map, or the elements of a collection, in container order.
    /// Bounded maps list the most recently used entry first.
    pub(crate) fn keys(&self) -> Vec<CacheKey> {
        match self {
            Self::Bounded(map) => map.lock().iter().map(|(k, _)| k.clone()).collect(),
            Self::Unbounded(map) => map.read().keys().cloned().collect(),
            Self::List(list) => list.read().clone(),
            Self::Set(set) => set.read().iter().cloned().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Bounded(map) => map.lock().len(),
            Self::Unbounded(map) => map.read().len(),
            Self::List(list) => list.read().len(),
            Self::Set(set) => set.read().len(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::num::NonZeroUsize;

    use super::*;

    #[test]
    fn test_bounded_read_refreshes_recency() {
        let container = Container::for_kind(ContainerKind::BoundedMap(NonZeroUsize::new(2).unwrap()));
        container.insert("a".into(), "1".into());
        container.insert("b".into(), "2".into());
        assert!(container.get(&"a".into()).is_some());
        container.insert("c".into(), "3".into());

        assert_eq!(container.len(), 2);
        assert!(container.contains_key(&"a".into()));
        assert!(!container.contains_key(&"b".into()));
        assert!(container.contains_key(&"c".into()));
    }

    #[test]
    fn test_collection_rejects_map_insert() {
        let container = Container::for_kind(ContainerKind::Set);
        assert!(!container.insert("a".into(), "1".into()));
        assert!(container.push("a".into()));
        assert!(container.push("a".into()));
        assert_eq!(container.len(), 1);

        let container = Container::for_kind(ContainerKind::List);
        assert!(container.push("a".into()));
        assert!(container.push("a".into()));
        assert_eq!(container.keys().len(), 2);
    }
}
