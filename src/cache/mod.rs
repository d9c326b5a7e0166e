//! The typed, category-keyed store that every caching strategy writes into.
//!
//! A [`CacheStore`] holds one container per [`CacheEntry`]. What kind of container
//! a category uses, a bounded LRU map, an unbounded map, a list or a set, is fixed
//! by the static catalog on [`CacheEntry::container_kind`]:
//!
//! ```
//! use mzcache::cache::{CacheEntry, CacheStore, CacheValue};
//! use mzcache::ident::SpectrumReference;
//!
//! let store = CacheStore::new();
//! store.put_key(CacheEntry::SpectrumId, "index=0").unwrap();
//! store
//!     .put(CacheEntry::PeptideToSpectrum, "SII_1", SpectrumReference::new("1", "SD_1"))
//!     .unwrap();
//!
//! // Sets reject key-value pairs
//! assert!(store.put(CacheEntry::SpectrumId, "index=1", "x").is_err());
//!
//! let reference = store
//!     .get(CacheEntry::PeptideToSpectrum, "SII_1")
//!     .and_then(CacheValue::into_spectrum_reference)
//!     .unwrap();
//! assert_eq!(reference.spectrum, "1");
//! ```
mod container;
mod entry;
mod store;
mod value;

pub use entry::{CacheEntry, ContainerKind};
pub use store::{CacheConfig, CacheError, CacheStore, CacheStoreBuilder};
pub use value::{CacheKey, CacheValue};
